//! Text patterns recognised in program log lines.

use chainbell_sdk::objects::Role;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};

/// Base58 address, 32..=44 characters.
const ADDRESS: &str = r"[1-9A-HJ-NP-Za-km-z]{32,44}";

lazy_static! {
    static ref INSTRUCTION_RE: Regex =
        build(r"Instruction:\s*([A-Za-z_][A-Za-z0-9_]*)");
    static ref ADDRESS_RE: Regex = build(&format!(r"\b({ADDRESS})\b"));
    static ref ROLE_RE: Regex = build(&format!(
        r"(?i)\b(buyer|seller|maker|taker|user)\s*[:=]\s*({ADDRESS})\b"
    ));
    static ref SIGNER_RE: Regex =
        build(&format!(r"(?i)\b(?:signer|authority)\s*[:=]\s*({ADDRESS})\b"));
    static ref PROGRAM_FRAME_RE: Regex = build(&format!(
        r"^Program ({ADDRESS}) (?:invoke|success|consumed|failed)"
    ));
    static ref AMOUNT_RE: Regex = build(r"(?i)\bamount\s*[:=]\s*(\d+)\b");
    static ref CURRENCY_RE: Regex = build(r"(?i)\bcurrency\s*[:=]\s*([A-Za-z]{3})\b");
    static ref PRICE_RE: Regex = build(r"(?i)\bprice\s*[:=]\s*(\d+(?:\.\d+)?)");
    static ref MINT_RE: Regex = build(&format!(r"(?i)\bmint\s*[:=]\s*({ADDRESS})\b"));
    static ref DISPUTE_ID_RE: Regex =
        build(r"(?i)\bdispute(?:_id| id)?\s*[:=#]\s*(\d+)\b");
    static ref REASON_RE: Regex = build(r"(?i)\breason\s*[:=]\s*(.+?)\s*$");
}

#[allow(clippy::expect_used)]
fn build(pattern: &str) -> Regex {
    Regex::new(pattern).expect("log pattern literal compiles")
}

/// Payload marker emitted by the program for binary events.
pub const PAYLOAD_MARKER: &str = "Program data: ";

/// Instruction name announced by a log line, if any.
pub fn instruction_name(line: &str) -> Option<&str> {
    INSTRUCTION_RE
        .captures(line)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Every address-shaped token in the line, in order of appearance.
pub fn addresses(line: &str) -> impl Iterator<Item = &str> {
    ADDRESS_RE.captures_iter(line).filter_map(|c| c.get(1)).map(|m| m.as_str())
}

/// `role: <address>` pairs in the line.
pub fn role_addresses(line: &str) -> impl Iterator<Item = (Role, &str)> {
    ROLE_RE.captures_iter(line).filter_map(|c| {
        let role = c.get(1)?.as_str().to_ascii_lowercase().parse().ok()?;
        Some((role, c.get(2)?.as_str()))
    })
}

/// `signer: <address>` / `authority: <address>` in the line.
pub fn signer_address(line: &str) -> Option<&str> {
    SIGNER_RE.captures(line).and_then(|c| c.get(1)).map(|m| m.as_str())
}

/// Program id of a `Program <id> invoke|success|consumed|failed` frame line.
pub fn program_frame(line: &str) -> Option<&str> {
    PROGRAM_FRAME_RE
        .captures(line)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Extract `amount`, `currency`, `price`, `mint`, `dispute_id` and `reason`
/// from log text. The first occurrence of each field wins.
pub fn extract_fields<S: AsRef<str>>(lines: &[S]) -> Map<String, Value> {
    let mut data = Map::new();
    for line in lines.iter().map(AsRef::as_ref) {
        if line.starts_with(PAYLOAD_MARKER) {
            continue;
        }
        insert_first(&mut data, "amount", &AMOUNT_RE, line, |s| {
            s.parse::<u64>().ok().map(Value::from)
        });
        insert_first(&mut data, "currency", &CURRENCY_RE, line, |s| {
            Some(Value::from(s.to_ascii_uppercase()))
        });
        insert_first(&mut data, "price", &PRICE_RE, line, |s| Some(Value::from(s)));
        insert_first(&mut data, "mint", &MINT_RE, line, |s| Some(Value::from(s)));
        insert_first(&mut data, "dispute_id", &DISPUTE_ID_RE, line, |s| {
            s.parse::<u64>().ok().map(Value::from)
        });
        insert_first(&mut data, "reason", &REASON_RE, line, |s| Some(Value::from(s)));
    }
    data
}

fn insert_first(
    data: &mut Map<String, Value>,
    key: &str,
    re: &Regex,
    line: &str,
    convert: impl Fn(&str) -> Option<Value>,
) {
    if data.contains_key(key) {
        return;
    }
    if let Some(value) = re
        .captures(line)
        .and_then(|c| c.get(1))
        .and_then(|m| convert(m.as_str()))
    {
        data.insert(key.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDR: &str = "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin";

    #[test]
    fn test_instruction_name() {
        assert_eq!(
            instruction_name("Program log: Instruction: CreateBuyOrder"),
            Some("CreateBuyOrder")
        );
        assert_eq!(instruction_name("Program log: created"), None);
    }

    #[test]
    fn test_role_patterns_are_case_insensitive() {
        let line = format!("Program log: Buyer: {ADDR}, taker={ADDR}");
        let found: Vec<_> = role_addresses(&line).collect();
        assert_eq!(found, vec![(Role::Buyer, ADDR), (Role::Taker, ADDR)]);
    }

    #[test]
    fn test_signer_pattern() {
        assert_eq!(signer_address(&format!("authority = {ADDR}")), Some(ADDR));
        assert_eq!(signer_address(&format!("owner: {ADDR}")), None);
    }

    #[test]
    fn test_program_frame() {
        assert_eq!(
            program_frame("Program TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA invoke [2]"),
            Some("TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA")
        );
        assert_eq!(program_frame("Program log: Instruction: X"), None);
    }

    #[test]
    fn test_extract_fields() {
        let lines = [
            "Program log: Instruction: OpenDispute".to_string(),
            format!("Program log: amount: 1500000000 currency: eur mint: {ADDR}"),
            "Program log: fiat_amount: 99 price: 5.25".to_string(),
            "Program log: dispute #42 reason: payout never arrived ".to_string(),
            "Program log: amount: 7".to_string(),
        ];
        let data = extract_fields(&lines);
        assert_eq!(data["amount"], Value::from(1_500_000_000u64));
        assert_eq!(data["currency"], Value::from("EUR"));
        assert_eq!(data["mint"], Value::from(ADDR));
        assert_eq!(data["price"], Value::from("5.25"));
        assert_eq!(data["dispute_id"], Value::from(42u64));
        assert_eq!(data["reason"], Value::from("payout never arrived"));
    }

    #[test]
    fn test_fiat_amount_is_not_amount() {
        let data = extract_fields(&["fiat_amount: 99"]);
        assert!(!data.contains_key("amount"));
    }

    #[test]
    fn test_patterns_compile() {
        lazy_static::initialize(&INSTRUCTION_RE);
        lazy_static::initialize(&ADDRESS_RE);
        lazy_static::initialize(&ROLE_RE);
        lazy_static::initialize(&SIGNER_RE);
        lazy_static::initialize(&PROGRAM_FRAME_RE);
        lazy_static::initialize(&AMOUNT_RE);
        lazy_static::initialize(&CURRENCY_RE);
        lazy_static::initialize(&PRICE_RE);
        lazy_static::initialize(&MINT_RE);
        lazy_static::initialize(&DISPUTE_ID_RE);
        lazy_static::initialize(&REASON_RE);
    }
}
