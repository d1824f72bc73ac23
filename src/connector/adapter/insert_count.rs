use serde_json::Value;

const COUNT_FIELDS: &[&str] = &["insertedCount", "inserted", "count"];

/// Work out how many records an insert call wrote.
///
/// A structured count in `result` wins. Older deployments only answer with a
/// free-text confirmation, in which case every integer in `message` is returned.
pub fn inserted_counts(result: Option<&Value>, message: &str) -> Vec<u64> {
    if let Some(count) = result.and_then(structured_count) {
        return vec![count];
    }
    extract_numbers(message)
}

fn structured_count(result: &Value) -> Option<u64> {
    match result {
        Value::Number(n) => n.as_u64(),
        Value::Object(map) => COUNT_FIELDS
            .iter()
            .find_map(|field| map.get(*field).and_then(Value::as_u64)),
        _ => None,
    }
}

/// Every run of ASCII digits in `message`, in order of appearance.
///
/// Runs too large for a `u64` are skipped.
pub fn extract_numbers(message: &str) -> Vec<u64> {
    message
        .split(|c: char| !c.is_ascii_digit())
        .filter(|run| !run.is_empty())
        .filter_map(|run| run.parse().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extract_numbers_reads_all_integers() {
        assert_eq!(
            extract_numbers("3 objects inserted into segment 5"),
            vec![3, 5]
        );
        assert_eq!(extract_numbers("Insert data to table successfully."), Vec::<u64>::new());
        assert_eq!(extract_numbers("batch-12/7:done"), vec![12, 7]);
    }

    #[test]
    fn extract_numbers_ignores_signs_and_decimals() {
        assert_eq!(extract_numbers("-4 and 2.5"), vec![4, 2, 5]);
    }

    #[test]
    fn extract_numbers_skips_overflowing_runs() {
        assert_eq!(extract_numbers("99999999999999999999999 then 1"), vec![1]);
    }

    #[test]
    fn structured_count_takes_precedence() {
        let result = json!({"insertedCount": 4});
        assert_eq!(inserted_counts(Some(&result), "wrote 4 rows in 2 segments"), vec![4]);
        assert_eq!(inserted_counts(Some(&json!(7)), ""), vec![7]);
    }

    #[test]
    fn falls_back_to_message_when_result_has_no_count() {
        assert_eq!(
            inserted_counts(Some(&json!({"status": "ok"})), "3 objects inserted into segment 5"),
            vec![3, 5]
        );
        assert_eq!(inserted_counts(None, "2 rows"), vec![2]);
    }
}
