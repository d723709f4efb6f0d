use crate::models::Record;

/// Render a user's records as CSV, one row per record with the
/// kind-specific fields flattened into a single details column.
pub fn records_csv(records: &[Record]) -> String {
    let mut out = String::from("kind,name,notes,details,created_at,updated_at\n");
    for record in records {
        let row = [
            record.kind.as_str().to_string(),
            record.name.clone(),
            record.notes.clone(),
            record.details.summary(),
            record.created_at.clone(),
            record.updated_at.clone(),
        ];
        let line = row
            .iter()
            .map(|field| csv_field(field))
            .collect::<Vec<_>>()
            .join(",");
        out.push_str(&line);
        out.push('\n');
    }
    out
}

/// Quote a field when it contains a delimiter, quote or line break.
fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecordDetails;

    #[test]
    fn csv_starts_with_header() {
        let out = records_csv(&[]);
        assert_eq!(out, "kind,name,notes,details,created_at,updated_at\n");
    }

    #[test]
    fn plain_fields_stay_unquoted() {
        assert_eq!(csv_field("rent"), "rent");
    }

    #[test]
    fn fields_with_commas_and_quotes_are_escaped() {
        assert_eq!(csv_field("a,b"), "\"a,b\"");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_field("line\nbreak"), "\"line\nbreak\"");
    }

    #[test]
    fn rows_carry_the_details_summary() {
        let record = crate::models::Record::new(
            "u1",
            "Dentist",
            "",
            RecordDetails::Health {
                specialization: Some("dentistry".into()),
                practitioner: None,
                visit_date: None,
                location: None,
            },
        );
        let out = records_csv(&[record]);
        let mut lines = out.lines();
        lines.next();
        let row = lines.next().unwrap();
        assert!(row.starts_with("health,Dentist,,"));
        assert!(row.contains("Specialization: dentistry"));
    }
}
