/// Format a count with thousands separators: 1,234,567
pub fn count(val: usize) -> String {
    let digits = val.to_string();
    let mut with_commas = String::new();
    for (i, c) in digits.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    with_commas.chars().rev().collect()
}

/// "1 row" / "3 rows"
pub fn rows(val: usize) -> String {
    if val == 1 {
        "1 row".to_string()
    } else {
        format!("{} rows", count(val))
    }
}
