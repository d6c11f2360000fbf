// ABOUTME: Formats dates using Go-style reference layouts
// ABOUTME: Maps tokens such as 2006, Jan, 15:04:05 and -07:00 onto chrono fields

use chrono::{DateTime, Datelike, Offset, TimeZone, Timelike};
use std::fmt::{Display, Write};

const LONG_MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const LONG_DAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    LongYear,
    Year,
    LongMonth,
    Month,
    NumMonth,
    ZeroMonth,
    LongWeekDay,
    WeekDay,
    Day,
    UnderDay,
    ZeroDay,
    UnderYearDay,
    ZeroYearDay,
    Hour,
    Hour12,
    ZeroHour12,
    Minute,
    ZeroMinute,
    Second,
    ZeroSecond,
    UpperPm,
    LowerPm,
    TzName,
    Offset(OffsetStyle),
    Fraction { digits: usize, trim: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OffsetStyle {
    colons: bool,
    minutes: bool,
    seconds: bool,
    z_for_utc: bool,
}

const OFFSET_LAYOUTS: [(&str, OffsetStyle); 5] = [
    (
        "070000",
        OffsetStyle { colons: false, minutes: true, seconds: true, z_for_utc: false },
    ),
    (
        "07:00:00",
        OffsetStyle { colons: true, minutes: true, seconds: true, z_for_utc: false },
    ),
    (
        "0700",
        OffsetStyle { colons: false, minutes: true, seconds: false, z_for_utc: false },
    ),
    (
        "07:00",
        OffsetStyle { colons: true, minutes: true, seconds: false, z_for_utc: false },
    ),
    (
        "07",
        OffsetStyle { colons: false, minutes: false, seconds: false, z_for_utc: false },
    ),
];

/// Splits off the next reference token, returning (literal prefix, token, rest).
fn next_token(layout: &str) -> (&str, Option<Token>, &str) {
    let bytes = layout.as_bytes();
    for (i, _) in layout.char_indices() {
        let rest = &layout[i..];
        if let Some((token, len)) = match_token(rest, bytes, i) {
            return (&layout[..i], Some(token), &layout[i + len..]);
        }
    }
    (layout, None, "")
}

fn match_token(rest: &str, bytes: &[u8], i: usize) -> Option<(Token, usize)> {
    let candidates: &[(&str, Token)] = match bytes[i] {
        b'J' => &[("January", Token::LongMonth), ("Jan", Token::Month)],
        b'M' => &[
            ("Monday", Token::LongWeekDay),
            ("Mon", Token::WeekDay),
            ("MST", Token::TzName),
        ],
        b'0' => &[
            ("002", Token::ZeroYearDay),
            ("01", Token::ZeroMonth),
            ("02", Token::ZeroDay),
            ("03", Token::ZeroHour12),
            ("04", Token::ZeroMinute),
            ("05", Token::ZeroSecond),
            ("06", Token::Year),
        ],
        b'1' => &[("15", Token::Hour), ("1", Token::NumMonth)],
        b'2' => &[("2006", Token::LongYear), ("2", Token::Day)],
        b'_' => {
            if rest.starts_with("_2006") {
                // literal underscore followed by a year
                return None;
            }
            &[("__2", Token::UnderYearDay), ("_2", Token::UnderDay)]
        }
        b'3' => &[("3", Token::Hour12)],
        b'4' => &[("4", Token::Minute)],
        b'5' => &[("5", Token::Second)],
        b'P' => &[("PM", Token::UpperPm)],
        b'p' => &[("pm", Token::LowerPm)],
        b'-' | b'Z' => return match_offset(rest, bytes[i] == b'Z'),
        b'.' | b',' => return match_fraction(rest),
        _ => return None,
    };

    candidates
        .iter()
        .find(|(text, _)| rest.starts_with(text))
        .map(|(text, token)| (*token, text.len()))
}

fn match_offset(rest: &str, z_for_utc: bool) -> Option<(Token, usize)> {
    let tail = &rest[1..];
    OFFSET_LAYOUTS
        .iter()
        .find(|(text, _)| tail.starts_with(text))
        .map(|(text, style)| {
            (
                Token::Offset(OffsetStyle { z_for_utc, ..*style }),
                text.len() + 1,
            )
        })
}

fn match_fraction(rest: &str) -> Option<(Token, usize)> {
    let bytes = rest.as_bytes();
    let digit = *bytes.get(1)?;
    if digit != b'0' && digit != b'9' {
        return None;
    }

    let run = bytes[1..].iter().take_while(|b| **b == digit).count();
    if bytes.get(1 + run).is_some_and(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((
        Token::Fraction {
            digits: run,
            trim: digit == b'9',
        },
        run + 1,
    ))
}

/// Renders `dt` according to a Go reference layout such as
/// `Mon Jan _2 15:04:05 MST 2006`. Text that is not a reference token is
/// copied through unchanged.
pub fn format<Tz>(dt: &DateTime<Tz>, layout: &str) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut out = String::with_capacity(layout.len() + 8);
    let mut remaining = layout;

    loop {
        let (literal, token, rest) = next_token(remaining);
        out.push_str(literal);
        match token {
            Some(token) => write_token(&mut out, dt, token),
            None => break,
        }
        remaining = rest;
    }

    out
}

fn write_token<Tz>(out: &mut String, dt: &DateTime<Tz>, token: Token)
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let hour12 = match dt.hour() % 12 {
        0 => 12,
        h => h,
    };

    // Writing into a String cannot fail.
    let _ = match token {
        Token::LongYear => write!(out, "{:04}", dt.year()),
        Token::Year => write!(out, "{:02}", dt.year().rem_euclid(100)),
        Token::LongMonth => write!(out, "{}", LONG_MONTHS[dt.month0() as usize]),
        Token::Month => write!(out, "{}", &LONG_MONTHS[dt.month0() as usize][..3]),
        Token::NumMonth => write!(out, "{}", dt.month()),
        Token::ZeroMonth => write!(out, "{:02}", dt.month()),
        Token::LongWeekDay => write!(
            out,
            "{}",
            LONG_DAYS[dt.weekday().num_days_from_monday() as usize]
        ),
        Token::WeekDay => write!(
            out,
            "{}",
            &LONG_DAYS[dt.weekday().num_days_from_monday() as usize][..3]
        ),
        Token::Day => write!(out, "{}", dt.day()),
        Token::UnderDay => write!(out, "{:>2}", dt.day()),
        Token::ZeroDay => write!(out, "{:02}", dt.day()),
        Token::UnderYearDay => write!(out, "{:>3}", dt.ordinal()),
        Token::ZeroYearDay => write!(out, "{:03}", dt.ordinal()),
        Token::Hour => write!(out, "{:02}", dt.hour()),
        Token::Hour12 => write!(out, "{}", hour12),
        Token::ZeroHour12 => write!(out, "{:02}", hour12),
        Token::Minute => write!(out, "{}", dt.minute()),
        Token::ZeroMinute => write!(out, "{:02}", dt.minute()),
        Token::Second => write!(out, "{}", dt.second()),
        Token::ZeroSecond => write!(out, "{:02}", dt.second()),
        Token::UpperPm => out.write_str(if dt.hour() >= 12 { "PM" } else { "AM" }),
        Token::LowerPm => out.write_str(if dt.hour() >= 12 { "pm" } else { "am" }),
        Token::TzName => {
            write_zone_name(out, dt);
            Ok(())
        }
        Token::Offset(style) => {
            write_offset(out, dt.offset().fix().local_minus_utc(), style);
            Ok(())
        }
        Token::Fraction { digits, trim } => {
            write_fraction(out, dt.nanosecond() % 1_000_000_000, digits, trim);
            Ok(())
        }
    };
}

/// Zone abbreviation such as `UTC` or `EST`. Zones that only know their
/// offset (`chrono::Local`, fixed offsets) print `UTC` at zero and `-0700`
/// otherwise.
fn write_zone_name<Tz>(out: &mut String, dt: &DateTime<Tz>)
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let name = dt.format("%Z").to_string();
    let offset_only = name.is_empty()
        || (name.starts_with(|c: char| c == '+' || c == '-') && name.contains(':'));
    if !offset_only {
        out.push_str(&name);
        return;
    }

    let offset_secs = dt.offset().fix().local_minus_utc();
    if offset_secs == 0 {
        out.push_str("UTC");
    } else {
        write_offset(
            out,
            offset_secs,
            OffsetStyle { colons: false, minutes: true, seconds: false, z_for_utc: false },
        );
    }
}

fn write_offset(out: &mut String, offset_secs: i32, style: OffsetStyle) {
    if offset_secs == 0 && style.z_for_utc {
        out.push('Z');
        return;
    }

    let sign = if offset_secs < 0 { '-' } else { '+' };
    let abs = offset_secs.unsigned_abs();
    let sep = if style.colons { ":" } else { "" };

    let _ = write!(out, "{}{:02}", sign, abs / 3600);
    if style.minutes {
        let _ = write!(out, "{}{:02}", sep, (abs % 3600) / 60);
    }
    if style.seconds {
        let _ = write!(out, "{}{:02}", sep, abs % 60);
    }
}

fn write_fraction(out: &mut String, nanos: u32, digits: usize, trim: bool) {
    let full = format!("{:09}", nanos);
    let mut frac = &full[..digits.min(9)];
    if trim {
        frac = frac.trim_end_matches('0');
        if frac.is_empty() {
            return;
        }
    }
    out.push('.');
    out.push_str(frac);
}
