//! Message extractors
//!
//! Every stage validates input with one of these extractors. The shared
//! policy: try the specific phrasal patterns first, then fall back to
//! treating the entire trimmed message as the value. Extractors only parse;
//! range checks and transitions live in the rule table.

use once_cell::sync::Lazy;
use regex::Regex;

static GREETING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:hi|hiya|hello|hey|howdy|start|restart|good\s+(?:morning|afternoon|evening))[\s!.,]*$")
        .expect("valid greeting regex")
});

static NAME_PHRASE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:my\s+name\s+is|i\s+am|i'm|this\s+is)\s+(.+)$").expect("valid name regex")
});

static BUDGET_PREFIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:my\s+)?(?:budget\s+is|i\s+have|around|about)\s+")
        .expect("valid budget prefix regex")
});

static BUDGET_SHAPE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^[\d.,]+[MK]?$").expect("valid budget shape regex"));

static LOCATION_PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:in|at)\s+(.+)$").expect("valid location regex"));

static BEDROOM_PHRASE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(\d{1,3})\s*(?:bed(?:room)?s?|br)\b").expect("valid bedroom regex")
});

static WANT_NEED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bi\s+(?:want|need)\s+(\d{1,3})\b").expect("valid want/need regex")
});

static BARE_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,3})$").expect("valid number regex"));

static PROPERTY_SELECT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:property|number)\s*(\d{1,3})$").expect("valid property select regex")
});

static SLOT_SELECT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:slot|number)\s*(\d{1,3})$").expect("valid slot select regex")
});

static CANCEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bcancel\b").expect("valid cancel regex"));

/// Synonym groups mapped to the stock catalog labels.
const INTEREST_SYNONYMS: &[(&str, &[&str])] = &[
    ("Buy", &["buy", "buying", "purchase", "purchasing", "invest", "investment"]),
    ("Rent", &["rent", "renting", "rental", "lease", "leasing"]),
    ("Land", &["land", "plot", "plots", "acre", "acres"]),
];

/// Does the message read as a greeting / restart request?
pub fn is_greeting(msg: &str) -> bool {
    GREETING_RE.is_match(msg)
}

/// Does the message contain the cancel keyword?
pub fn is_cancel(msg: &str) -> bool {
    CANCEL_RE.is_match(msg)
}

/// The follow-up answer, if the message is exactly "1" or "2".
pub fn followup_choice(msg: &str) -> Option<u8> {
    match msg {
        "1" => Some(1),
        "2" => Some(2),
        _ => None,
    }
}

/// Lowercased word tokens of a string (alphanumeric runs).
fn tokens(s: &str) -> Vec<String> {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

/// Detect an interest by keyword match against the tenant catalog.
///
/// A catalog entry matches when its words appear consecutively in the
/// message. Failing that, a synonym group (buy/purchase/invest, rent/lease,
/// land/plot/acre) resolves to the catalog entry carrying its canonical
/// label; the catalog's spelling always wins.
pub fn detect_interest(msg: &str, catalog: &[String]) -> Option<String> {
    let msg_tokens = tokens(msg);

    for entry in catalog {
        let entry_tokens = tokens(entry);
        if entry_tokens.is_empty() {
            continue;
        }
        if msg_tokens
            .windows(entry_tokens.len())
            .any(|w| w == entry_tokens.as_slice())
        {
            return Some(entry.clone());
        }
    }

    for (canonical, synonyms) in INTEREST_SYNONYMS {
        if msg_tokens.iter().any(|t| synonyms.contains(&t.as_str())) {
            if let Some(entry) = catalog.iter().find(|e| e.eq_ignore_ascii_case(canonical)) {
                return Some(entry.clone());
            }
        }
    }

    None
}

/// Resolve an explicit property-type choice: a 1-based option number, the
/// type name, or a synonym.
pub fn choose_property_type(msg: &str, catalog: &[String]) -> Option<String> {
    if let Some(caps) = BARE_NUMBER_RE.captures(msg) {
        let n: usize = caps[1].parse().ok()?;
        if n >= 1 && n <= catalog.len() {
            return Some(catalog[n - 1].clone());
        }
        return None;
    }
    detect_interest(msg, catalog)
}

/// Extract a name: phrasal forms first, then the whole message if it
/// resembles a name. Returned names are capitalization-normalized.
pub fn extract_name(msg: &str) -> Option<String> {
    let candidate = match NAME_PHRASE_RE.captures(msg) {
        Some(caps) => caps[1].trim().to_string(),
        None => msg.to_string(),
    };
    if looks_like_name(&candidate) {
        Some(normalize_words(&candidate))
    } else {
        None
    }
}

/// Heuristic name shape: letters (plus spaces, hyphens, apostrophes, dots),
/// no digits, two-plus letters, at most five words.
fn looks_like_name(s: &str) -> bool {
    let letter_count = s.chars().filter(|c| c.is_alphabetic()).count();
    letter_count >= 2
        && s.len() <= 60
        && s.split_whitespace().count() <= 5
        && s.chars()
            .all(|c| c.is_alphabetic() || c.is_whitespace() || matches!(c, '-' | '\'' | '.'))
}

/// Word-by-word capitalization: first letter upper, rest lower.
pub fn normalize_words(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse a budget to an absolute currency amount.
///
/// Phrasal prefixes ("budget is", "i have", "around", "about") are stripped,
/// then every character other than digits, dot, comma, M and K is dropped.
/// The remainder must match `^[\d.,]+[MK]?$` (case-insensitive); commas are
/// thousands separators, `M` scales by 1,000,000 and `K` by 1,000.
pub fn parse_budget(msg: &str) -> Option<u64> {
    let mut rest = msg.trim();
    loop {
        match BUDGET_PREFIX_RE.find(rest) {
            Some(m) => rest = rest[m.end()..].trim_start(),
            None => break,
        }
    }

    let filtered: String = rest
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | 'M' | 'm' | 'K' | 'k'))
        .collect();

    if filtered.is_empty() || !BUDGET_SHAPE_RE.is_match(&filtered) {
        return None;
    }

    let (digits, multiplier) = match filtered.chars().last() {
        Some('M') | Some('m') => (&filtered[..filtered.len() - 1], 1_000_000f64),
        Some('K') | Some('k') => (&filtered[..filtered.len() - 1], 1_000f64),
        _ => (filtered.as_str(), 1f64),
    };

    let value: f64 = digits.replace(',', "").parse().ok()?;
    let amount = value * multiplier;
    if amount.is_finite() && amount >= 1.0 {
        Some(amount.round() as u64)
    } else {
        None
    }
}

/// Extract a location: "in X" / "at X" first, then the whole message.
/// The candidate must contain at least two letters.
pub fn extract_location(msg: &str) -> Option<String> {
    let candidate = match LOCATION_PREFIX_RE.captures(msg) {
        Some(caps) => caps[1].trim().to_string(),
        None => msg.to_string(),
    };
    let letters = candidate.chars().filter(|c| c.is_alphabetic()).count();
    if letters >= 2 {
        Some(normalize_words(&candidate))
    } else {
        None
    }
}

/// Extract a bedroom count: "N bed(room)s", "i want/need N", or a bare
/// number. No range check here; the rule enforces 1-20.
pub fn extract_bedrooms(msg: &str) -> Option<u32> {
    for re in [&*BEDROOM_PHRASE_RE, &*WANT_NEED_RE, &*BARE_NUMBER_RE] {
        if let Some(caps) = re.captures(msg) {
            return caps[1].parse().ok();
        }
    }
    None
}

/// Accept a plot-size string ("50x100", "1/4 Acre"). Anything three or more
/// characters after trimming passes; the value is stored verbatim.
pub fn extract_plot_size(msg: &str) -> Option<String> {
    let trimmed = msg.trim();
    if trimmed.len() >= 3 {
        Some(trimmed.to_string())
    } else {
        None
    }
}

/// Extract a 1-based property selection: "property N", "number N", bare N.
pub fn extract_property_selection(msg: &str) -> Option<u32> {
    selection(msg, &PROPERTY_SELECT_RE)
}

/// Extract a 1-based slot selection: "slot N", "number N", bare N.
pub fn extract_slot_selection(msg: &str) -> Option<u32> {
    selection(msg, &SLOT_SELECT_RE)
}

fn selection(msg: &str, phrasal: &Regex) -> Option<u32> {
    let caps = phrasal
        .captures(msg)
        .or_else(|| BARE_NUMBER_RE.captures(msg))?;
    let n: u32 = caps[1].parse().ok()?;
    if n >= 1 {
        Some(n)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<String> {
        vec!["Buy".to_string(), "Rent".to_string(), "Land".to_string()]
    }

    #[test]
    fn test_greeting_variants() {
        for msg in ["hi", "Hi!", "HELLO", "hey.", "start", "good morning"] {
            assert!(is_greeting(msg), "{msg} should greet");
        }
        for msg in ["hill", "this is Jane", "higher", "heyday"] {
            assert!(!is_greeting(msg), "{msg} should not greet");
        }
    }

    #[test]
    fn test_detect_interest_configured_type() {
        assert_eq!(
            detect_interest("I want to rent a flat", &catalog()),
            Some("Rent".to_string())
        );
    }

    #[test]
    fn test_detect_interest_synonym_maps_to_catalog_spelling() {
        let types = vec!["Buy".to_string(), "Rent".to_string()];
        assert_eq!(
            detect_interest("looking to purchase something", &types),
            Some("Buy".to_string())
        );
        // land synonym has no catalog entry here
        assert_eq!(detect_interest("a plot please", &types), None);
    }

    #[test]
    fn test_detect_interest_multiword_type() {
        let types = vec!["Short Let".to_string(), "Rent".to_string()];
        assert_eq!(
            detect_interest("do you have a short let?", &types),
            Some("Short Let".to_string())
        );
    }

    #[test]
    fn test_detect_interest_no_match() {
        assert_eq!(detect_interest("hello there", &catalog()), None);
    }

    #[test]
    fn test_choose_property_type_by_number() {
        assert_eq!(choose_property_type("2", &catalog()), Some("Rent".to_string()));
        assert_eq!(choose_property_type("0", &catalog()), None);
        assert_eq!(choose_property_type("4", &catalog()), None);
    }

    #[test]
    fn test_choose_property_type_by_name() {
        assert_eq!(
            choose_property_type("land", &catalog()),
            Some("Land".to_string())
        );
    }

    #[test]
    fn test_extract_name_phrasal() {
        assert_eq!(extract_name("my name is john smith"), Some("John Smith".to_string()));
        assert_eq!(extract_name("I am JANE"), Some("Jane".to_string()));
        assert_eq!(extract_name("I'm mary-anne o'neil"), Some("Mary-anne O'neil".to_string()));
        assert_eq!(extract_name("this is Peter"), Some("Peter".to_string()));
    }

    #[test]
    fn test_extract_name_bare() {
        assert_eq!(extract_name("john smith"), Some("John Smith".to_string()));
    }

    #[test]
    fn test_extract_name_rejects_non_names() {
        assert_eq!(extract_name("12345"), None);
        assert_eq!(extract_name("x"), None);
        assert_eq!(extract_name("call me at +254700000001"), None);
    }

    #[test]
    fn test_normalize_words() {
        assert_eq!(normalize_words("john smith"), "John Smith");
        assert_eq!(normalize_words("  KAREN   wanjiru "), "Karen Wanjiru");
    }

    #[test]
    fn test_parse_budget_suffixes() {
        assert_eq!(parse_budget("5M"), Some(5_000_000));
        assert_eq!(parse_budget("500K"), Some(500_000));
        assert_eq!(parse_budget("1,200,000"), Some(1_200_000));
        assert_eq!(parse_budget("1.5m"), Some(1_500_000));
    }

    #[test]
    fn test_parse_budget_phrasal_prefixes() {
        assert_eq!(parse_budget("my budget is 5M"), Some(5_000_000));
        assert_eq!(parse_budget("i have around 750k"), Some(750_000));
        assert_eq!(parse_budget("about 40000"), Some(40_000));
    }

    #[test]
    fn test_parse_budget_strips_currency_noise() {
        assert_eq!(parse_budget("$1.2M"), Some(1_200_000));
        assert_eq!(parse_budget("2,500,000 shillings"), Some(2_500_000));
        // a leading currency code survives the filter as a stray letter
        assert_eq!(parse_budget("KES 2,500,000"), None);
    }

    #[test]
    fn test_parse_budget_rejects_garbage() {
        assert_eq!(parse_budget("abc"), None);
        assert_eq!(parse_budget(""), None);
        assert_eq!(parse_budget("..,,"), None);
        assert_eq!(parse_budget("1.2.3.4M"), None);
        assert_eq!(parse_budget("0"), None);
    }

    #[test]
    fn test_extract_location() {
        assert_eq!(extract_location("in nairobi"), Some("Nairobi".to_string()));
        assert_eq!(extract_location("at karen hardy"), Some("Karen Hardy".to_string()));
        assert_eq!(extract_location("westlands"), Some("Westlands".to_string()));
        assert_eq!(extract_location("7"), None);
        assert_eq!(extract_location("a"), None);
    }

    #[test]
    fn test_extract_bedrooms() {
        assert_eq!(extract_bedrooms("3 bed"), Some(3));
        assert_eq!(extract_bedrooms("4 bedrooms"), Some(4));
        assert_eq!(extract_bedrooms("2br"), Some(2));
        assert_eq!(extract_bedrooms("i want 5"), Some(5));
        assert_eq!(extract_bedrooms("i need 2"), Some(2));
        assert_eq!(extract_bedrooms("3"), Some(3));
        assert_eq!(extract_bedrooms("25"), Some(25)); // range checked by the rule
        assert_eq!(extract_bedrooms("no idea"), None);
    }

    #[test]
    fn test_extract_plot_size() {
        assert_eq!(extract_plot_size("50x100"), Some("50x100".to_string()));
        assert_eq!(extract_plot_size("1/4 Acre"), Some("1/4 Acre".to_string()));
        assert_eq!(extract_plot_size("ha"), None);
    }

    #[test]
    fn test_property_selection() {
        assert_eq!(extract_property_selection("property 2"), Some(2));
        assert_eq!(extract_property_selection("property2"), Some(2));
        assert_eq!(extract_property_selection("number 1"), Some(1));
        assert_eq!(extract_property_selection("3"), Some(3));
        assert_eq!(extract_property_selection("0"), None);
        assert_eq!(extract_property_selection("the second one"), None);
    }

    #[test]
    fn test_slot_selection() {
        assert_eq!(extract_slot_selection("slot 4"), Some(4));
        assert_eq!(extract_slot_selection("slot4"), Some(4));
        assert_eq!(extract_slot_selection("2"), Some(2));
        assert_eq!(extract_slot_selection("tomorrow"), None);
    }

    #[test]
    fn test_cancel_keyword() {
        assert!(is_cancel("cancel"));
        assert!(is_cancel("please CANCEL my viewing"));
        assert!(!is_cancel("cancellation")); // word boundary
        assert!(!is_cancel("keep it"));
    }

    #[test]
    fn test_followup_choice() {
        assert_eq!(followup_choice("1"), Some(1));
        assert_eq!(followup_choice("2"), Some(2));
        assert_eq!(followup_choice("3"), None);
        assert_eq!(followup_choice("1 please"), None);
    }
}
