//! Console report for a finished command

use std::io::{self, Write};

use crate::engine::OperationOutcome;

/// Write the report: request charge, then the success or error line, then
/// the retrieved items when a read ran.
pub fn write_report<W: Write>(out: &mut W, outcome: &OperationOutcome) -> io::Result<()> {
    writeln!(out, "Request charge: {}", display_charge(outcome.request_charge))?;
    if outcome.success {
        writeln!(out, "Success: {}", outcome.status)?;
    } else {
        writeln!(out, "Error: {}", outcome.status)?;
    }

    if let Some(items) = &outcome.items {
        let json = serde_json::to_string(items).map_err(io::Error::from)?;
        writeln!(out, "Retrieved {} item(s): {}", items.len(), json)?;
    }
    Ok(())
}

/// Charges are billed to two decimals; summing pages leaves float noise
fn display_charge(charge: f64) -> f64 {
    (charge * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Document, StatusCode};
    use serde_json::json;

    fn render(outcome: &OperationOutcome) -> String {
        let mut buffer = Vec::new();
        write_report(&mut buffer, outcome).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn test_write_success_report() {
        let outcome = OperationOutcome {
            success: true,
            status: StatusCode::CREATED,
            request_charge: 1.24,
            items: None,
        };
        assert_eq!(
            render(&outcome),
            "Request charge: 1.24\nSuccess: 201 Created\n"
        );
    }

    #[test]
    fn test_failure_report() {
        let outcome = OperationOutcome {
            success: false,
            status: StatusCode::NOT_FOUND,
            request_charge: 0.0,
            items: None,
        };
        assert_eq!(render(&outcome), "Request charge: 0\nError: 404 Not Found\n");
    }

    #[test]
    fn test_read_report_lists_items() {
        let item: Document = serde_json::from_value(json!({ "id": "1" })).unwrap();
        let outcome = OperationOutcome {
            success: true,
            status: StatusCode::OK,
            request_charge: 3.8,
            items: Some(vec![item]),
        };
        assert_eq!(
            render(&outcome),
            "Request charge: 3.8\nSuccess: 200 OK\nRetrieved 1 item(s): [{\"id\":\"1\"}]\n"
        );
    }

    #[test]
    fn test_summed_charge_is_rounded() {
        let outcome = OperationOutcome {
            success: true,
            status: StatusCode::OK,
            request_charge: 0.1 + 0.2,
            items: None,
        };
        assert_eq!(render(&outcome), "Request charge: 0.3\nSuccess: 200 OK\n");
    }
}
