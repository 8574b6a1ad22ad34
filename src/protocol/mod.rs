pub mod command;
pub mod outcome;

use outcome::Outcome;

// the device acknowledges with '*' and flags errors with '!'; an error
// marker wins even when both appear
pub fn classify(response: Option<String>) -> Outcome {
    match response {
        None => Outcome::NoResponse,
        Some(text) if text.is_empty() => Outcome::NoResponse,
        Some(text) if text.contains('!') => Outcome::Failure,
        Some(text) if text.contains('*') => Outcome::Success(text),
        Some(_) => Outcome::Failure,
    }
}

// network info replies carry the address between "IP: " and the end of line
pub fn parse_network_info(response: &str) -> Option<String> {
    let start = response.find("IP: ")? + "IP: ".len();
    let rest = &response[start..];
    let end = rest.find(['\r', '\n']).unwrap_or(rest.len());
    let address = &rest[..end];
    if address.is_empty() {
        None
    } else {
        Some(address.to_string())
    }
}
