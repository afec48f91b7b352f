mod common;
mod inventory;
mod routing;
