use crate::cluster::House;

/// Every title token, sorted, joined with '/'.
pub fn display_name(house: &House) -> String {
    let mut tokens: Vec<&str> = house.title.iter().map(|t| t.as_str()).collect();
    tokens.sort_unstable();
    tokens.join("/")
}

/// Compact label for tables: the registrants when there are at most two,
/// otherwise the first operator name, otherwise the parenthesised part of the
/// last registrant.
pub fn short_name(house: &House) -> String {
    let registrants: Vec<&str> = house.registrants().collect();

    if registrants.len() <= 2 {
        return registrants.join("/");
    }

    if let Some(operator) = house.operators().next() {
        return operator.to_string();
    }

    let Some(last) = registrants.last() else {
        return String::new();
    };

    match (last.find('('), last.find(')')) {
        (Some(open), Some(close)) if open < close => format!("...{}...", &last[open..=close]),
        _ => last.to_string(),
    }
}
