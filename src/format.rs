//! Display formatting for the reader UI: Arabic-Indic numerals, clock-style
//! durations, and the joined verse-number labels used by marker tooltips.

const ARABIC_INDIC_DIGITS: [char; 10] = ['٠', '١', '٢', '٣', '٤', '٥', '٦', '٧', '٨', '٩'];

/// Replace every ASCII digit in `text` with its Arabic-Indic counterpart.
pub fn to_arabic_digits(text: &str) -> String {
    text.chars()
        .map(|ch| match ch.to_digit(10) {
            Some(d) => ARABIC_INDIC_DIGITS[d as usize],
            None => ch,
        })
        .collect()
}

/// Render a verse or surah number in Arabic-Indic digits.
pub fn arabic_number(n: u32) -> String {
    to_arabic_digits(&n.to_string())
}

/// `MM:SS` in Arabic-Indic digits; NaN/negative collapse to `٠٠:٠٠`.
pub fn format_duration(secs: f64) -> String {
    to_arabic_digits(&format_duration_latin(secs))
}

/// `MM:SS` in ASCII digits, used for log output.
pub fn format_duration_latin(secs: f64) -> String {
    if !secs.is_finite() || secs <= 0.0 {
        return "00:00".to_string();
    }
    let total = secs.floor() as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}

/// Join verse display numbers the way a tooltip reads them aloud: one number
/// as-is, two joined with `و`, three or more comma-separated with a final
/// `و`. Duplicates are dropped while preserving order.
pub fn join_display_numbers(numbers: &[u32]) -> String {
    let mut unique: Vec<u32> = Vec::with_capacity(numbers.len());
    for &n in numbers {
        if !unique.contains(&n) {
            unique.push(n);
        }
    }
    let localized: Vec<String> = unique.iter().map(|&n| arabic_number(n)).collect();
    match localized.len() {
        0 => String::new(),
        1 => localized[0].clone(),
        2 => format!("{} و {}", localized[0], localized[1]),
        _ => {
            let (last, head) = localized.split_last().expect("len checked above");
            format!("{} و {}", head.join("، "), last)
        }
    }
}

/// `surah:verse` reference in Arabic-Indic digits.
pub fn format_verse_ref(surah_number: u32, verse_number: u32) -> String {
    format!("{}:{}", arabic_number(surah_number), arabic_number(verse_number))
}

/// Display label for a playback-rate multiplier, e.g. `1x` or `1.25x`.
pub fn format_speed(multiplier: f32) -> String {
    if (multiplier.fract()).abs() < f32::EPSILON {
        format!("{}x", multiplier as i32)
    } else {
        format!("{multiplier}x")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_digits() {
        assert_eq!(to_arabic_digits("12:05"), "١٢:٠٥");
        assert_eq!(arabic_number(40), "٤٠");
    }

    #[test]
    fn formats_durations() {
        assert_eq!(format_duration_latin(125.7), "02:05");
        assert_eq!(format_duration(125.7), "٠٢:٠٥");
        assert_eq!(format_duration(f64::NAN), "٠٠:٠٠");
        assert_eq!(format_duration(-3.0), "٠٠:٠٠");
    }

    #[test]
    fn joins_single_number_unadorned() {
        assert_eq!(join_display_numbers(&[4]), "٤");
    }

    #[test]
    fn joins_two_numbers_with_and() {
        assert_eq!(join_display_numbers(&[4, 5]), "٤ و ٥");
    }

    #[test]
    fn joins_three_numbers_with_commas_and_final_and() {
        assert_eq!(join_display_numbers(&[4, 5, 6]), "٤، ٥ و ٦");
    }

    #[test]
    fn join_drops_duplicates() {
        assert_eq!(join_display_numbers(&[7, 7, 8]), "٧ و ٨");
    }

    #[test]
    fn speed_labels() {
        assert_eq!(format_speed(1.0), "1x");
        assert_eq!(format_speed(1.25), "1.25x");
    }

    #[test]
    fn verse_refs() {
        assert_eq!(format_verse_ref(2, 5), "٢:٥");
    }
}
