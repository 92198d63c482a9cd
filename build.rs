//! Build script.
//!
//! Migrations are embedded with `sqlx::migrate!`, so rebuild when they change.

fn main() {
    println!("cargo:rerun-if-changed=data/sql/sqlite");
}
