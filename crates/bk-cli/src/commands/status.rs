//! Status command for showing the database location and record counts.

use std::io::Write;
use std::path::Path;

use anyhow::Result;

use bk_db::Database;

pub fn run<W: Write>(writer: &mut W, db: &Database, database_path: &Path) -> Result<()> {
    let counts = db.counts()?;

    writeln!(writer, "Booking status")?;
    writeln!(writer, "Database: {}", database_path.display())?;
    writeln!(writer, "Events: {}", counts.events)?;
    writeln!(writer, "Resources: {}", counts.resources)?;
    writeln!(writer, "Allocations: {}", counts.allocations)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use bk_core::{NewEvent, NewResource};
    use chrono::NaiveDate;
    use insta::assert_snapshot;

    #[test]
    fn status_command_outputs_counts() {
        let temp = tempfile::tempdir().unwrap();
        let db_path = temp.path().join("bk.db");
        let db = Database::open(&db_path).unwrap();

        let day = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let event = db
            .insert_event(
                &NewEvent::new(
                    "Standup",
                    None,
                    day.and_hms_opt(10, 0, 0).unwrap(),
                    day.and_hms_opt(11, 0, 0).unwrap(),
                )
                .unwrap(),
            )
            .unwrap();
        let resource = db
            .insert_resource(&NewResource::new("Projector", "equipment").unwrap())
            .unwrap();
        db.insert_resource(&NewResource::new("Room A", "room").unwrap())
            .unwrap();
        db.insert_allocation(event.id, resource.id).unwrap();

        let mut output = Vec::new();
        run(&mut output, &db, &db_path).unwrap();

        let output = String::from_utf8(output).unwrap();
        let output = output.replace(&db_path.display().to_string(), "[TEMP]/bk.db");
        assert_snapshot!(output, @r"
        Booking status
        Database: [TEMP]/bk.db
        Events: 1
        Resources: 2
        Allocations: 1
        ");
    }
}
