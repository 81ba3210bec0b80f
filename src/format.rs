use crate::codes::Amount;

/// Whole US dollars with thousands separators: `1234.4` -> `$1,234`, `-1000` -> `-$1,000`.
///
/// Amounts that round to zero print as `$0` whatever their sign, so `-0.4` is `$0`
/// and never `-$0`. Browser `Intl.NumberFormat` output differs here.
pub fn format_currency(amount: Amount) -> String {
    let rounded = amount.round();
    let negative = rounded < 0.0;
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if negative {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}
