use crate::infra::InMemoryCoordinator;
use bto_allocation::allocation::{
    AllocationCoordinator, Applicant, ApplicationId, FixedClock, FlatInventory, FlatType,
    FlatTypeInfo, Manager, MaritalStatus, Officer, Project, UserId,
};
use bto_allocation::error::AppError;
use bto_allocation::persistence::{
    InMemoryApplicantRepository, InMemoryApplicationRepository, InMemoryProjectRepository,
};
use chrono::NaiveDate;
use clap::Args;
use std::collections::BTreeSet;
use std::sync::Arc;

const DEMO_PROJECT: &str = "Acacia Breeze";
const DEMO_MANAGER: &str = "T8765432F";
const DEMO_OFFICER: &str = "T2109876H";

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Date the walkthrough runs on (YYYY-MM-DD). Defaults to the demo project's opening date.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Skip the withdrawal portion of the demo.
    #[arg(long)]
    pub(crate) skip_withdrawal: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        today,
        skip_withdrawal,
    } = args;

    let project = demo_project()?;
    let today = today.unwrap_or(project.opening_date);
    let coordinator = demo_coordinator(project, today)?;

    println!("BTO allocation demo ({today})");
    println!("\nBooking contention for the last 2-Room unit");
    run_booking_contention(&coordinator)?;

    if !skip_withdrawal {
        println!("\nWithdrawal after booking");
        run_withdrawal(&coordinator)?;
    }

    Ok(())
}

fn demo_project() -> Result<Project, AppError> {
    let inventory = FlatInventory::new(vec![
        FlatTypeInfo::new(FlatType::TwoRoom, 1, 350_000),
        FlatTypeInfo::new(FlatType::ThreeRoom, 2, 450_000),
    ])
    .map_err(|err| invalid_demo_data(err.to_string()))?;
    let opening_date = NaiveDate::from_ymd_opt(2025, 2, 15)
        .ok_or_else(|| invalid_demo_data("bad opening date".to_string()))?;
    let closing_date = NaiveDate::from_ymd_opt(2025, 3, 20)
        .ok_or_else(|| invalid_demo_data("bad closing date".to_string()))?;

    Ok(Project {
        name: DEMO_PROJECT.to_string(),
        neighborhood: "Yishun".to_string(),
        opening_date,
        closing_date,
        manager_in_charge: UserId::new(DEMO_MANAGER),
        officer_slots: 3,
        officers: BTreeSet::from([UserId::new(DEMO_OFFICER)]),
        visible: true,
        inventory,
    })
}

fn invalid_demo_data(reason: String) -> AppError {
    AppError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, reason))
}

fn demo_applicants() -> Vec<Applicant> {
    vec![
        Applicant::new(UserId::new("S1234567A"), "John", 35, MaritalStatus::Single),
        Applicant::new(UserId::new("T7654321B"), "Sarah", 40, MaritalStatus::Married),
        Applicant::new(UserId::new("S9876543C"), "Grace", 37, MaritalStatus::Married),
    ]
}

fn demo_coordinator(project: Project, today: NaiveDate) -> Result<InMemoryCoordinator, AppError> {
    let now = today
        .and_hms_opt(9, 0, 0)
        .map(|moment| moment.and_utc())
        .ok_or_else(|| invalid_demo_data(format!("demo date {today} out of range")))?;

    Ok(AllocationCoordinator::with_clock(
        Arc::new(InMemoryProjectRepository::with_projects([project])),
        Arc::new(InMemoryApplicationRepository::default()),
        Arc::new(InMemoryApplicantRepository::with_applicants(demo_applicants())),
        Arc::new(FixedClock(now)),
    ))
}

fn manager() -> Manager {
    Manager {
        id: UserId::new(DEMO_MANAGER),
    }
}

fn officer() -> Officer {
    Officer {
        id: UserId::new(DEMO_OFFICER),
    }
}

fn submit_and_approve(
    coordinator: &InMemoryCoordinator,
    nric: &str,
    flat_type: FlatType,
) -> Result<ApplicationId, AppError> {
    let applicant = coordinator.applicant(&UserId::new(nric))?;
    let application = coordinator.submit(&applicant, DEMO_PROJECT, flat_type)?;
    println!(
        "  - {} applied for {} at {} ({})",
        applicant.name, flat_type, DEMO_PROJECT, application.id
    );
    let approved = coordinator.approve(&manager(), &application.id)?;
    println!("    manager {} marked it {}", DEMO_MANAGER, approved.status);
    Ok(approved.id)
}

fn print_remaining(coordinator: &InMemoryCoordinator, flat_type: FlatType) -> Result<(), AppError> {
    let project = coordinator.project(DEMO_PROJECT)?;
    let remaining = project.inventory.remaining_units(flat_type).unwrap_or(0);
    println!("    {flat_type} units remaining: {remaining}");
    Ok(())
}

fn run_booking_contention(coordinator: &InMemoryCoordinator) -> Result<(), AppError> {
    let first = submit_and_approve(coordinator, "S1234567A", FlatType::TwoRoom)?;
    let second = submit_and_approve(coordinator, "T7654321B", FlatType::TwoRoom)?;
    print_remaining(coordinator, FlatType::TwoRoom)?;

    let booked = coordinator.book_flat(&officer(), &first)?;
    println!("  - officer {} booked {} ({})", DEMO_OFFICER, booked.id, booked.status);
    print_remaining(coordinator, FlatType::TwoRoom)?;

    match coordinator.book_flat(&officer(), &second) {
        Ok(application) => println!("  - unexpected second booking {}", application.id),
        Err(err) => println!("  - second booking refused ({}): {err}", err.kind().label()),
    }
    Ok(())
}

fn run_withdrawal(coordinator: &InMemoryCoordinator) -> Result<(), AppError> {
    let id = submit_and_approve(coordinator, "S9876543C", FlatType::ThreeRoom)?;
    coordinator.book_flat(&officer(), &id)?;
    println!("  - officer {DEMO_OFFICER} booked {id}");
    print_remaining(coordinator, FlatType::ThreeRoom)?;

    let applicant = coordinator.applicant(&UserId::new("S9876543C"))?;
    coordinator.request_withdrawal(&applicant, &id)?;
    println!("  - {} requested withdrawal of {id}", applicant.name);

    let pending = coordinator.pending_withdrawals(&manager())?;
    println!("    pending withdrawals for {DEMO_MANAGER}: {}", pending.len());

    let withdrawn = coordinator.approve_withdrawal(&manager(), &id)?;
    println!("  - manager approved withdrawal; application is {}", withdrawn.status);
    print_remaining(coordinator, FlatType::ThreeRoom)?;
    Ok(())
}
