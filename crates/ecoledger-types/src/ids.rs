//! Identifier grammars for the credit namespace.
//!
//! The namespace is strictly hierarchical:
//!
//! ```text
//! credit type  C            (1–3 uppercase letters)
//! class        C01          (<abbrev><2+ digit sequence>)
//! project      C01-001      (<class>-<3+ digit sequence>)
//! batch        C01-001-20200101-20210101-001
//!              (<project>-<start>-<end>-<3+ digit sequence>)
//! ```
//!
//! Formatting always zero-pads to the minimum width; validation accepts
//! wider sequences so identifiers never overflow their grammar.

use chrono::NaiveDate;

use crate::error::{EcoError, Result};

/// Validate a credit type abbreviation: 1–3 uppercase ASCII letters.
///
/// # Errors
/// Returns [`EcoError::InvalidRequest`] on grammar violations.
pub fn validate_credit_type_abbrev(abbrev: &str) -> Result<()> {
    if abbrev.is_empty()
        || abbrev.len() > 3
        || !abbrev.chars().all(|c| c.is_ascii_uppercase())
    {
        return Err(EcoError::InvalidRequest(format!(
            "credit type abbreviation must be 1-3 uppercase latin letters: got {abbrev}"
        )));
    }
    Ok(())
}

/// Format a class id from its credit type abbreviation and sequence.
#[must_use]
pub fn format_class_id(abbrev: &str, sequence: u64) -> String {
    format!("{abbrev}{sequence:02}")
}

/// Validate a class id: `<abbrev><2+ digit sequence>`, e.g. `C01`.
///
/// # Errors
/// Returns [`EcoError::InvalidRequest`] on grammar violations.
pub fn validate_class_id(class_id: &str) -> Result<()> {
    let err = || {
        EcoError::InvalidRequest(format!(
            "class id must match the format <abbrev><sequence>: got {class_id}"
        ))
    };

    let letters = class_id
        .chars()
        .take_while(char::is_ascii_uppercase)
        .count();
    if !(1..=3).contains(&letters) {
        return Err(err());
    }
    let digits = &class_id[letters..];
    if digits.len() < 2 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(err());
    }
    Ok(())
}

/// Extract the credit type abbreviation embedded in a valid class id.
///
/// # Errors
/// Returns [`EcoError::InvalidRequest`] if the class id is malformed.
pub fn credit_type_abbrev_of(class_id: &str) -> Result<&str> {
    validate_class_id(class_id)?;
    let letters = class_id
        .chars()
        .take_while(char::is_ascii_uppercase)
        .count();
    Ok(&class_id[..letters])
}

/// Format a project id from its parent class id and sequence.
#[must_use]
pub fn format_project_id(class_id: &str, sequence: u64) -> String {
    format!("{class_id}-{sequence:03}")
}

/// Validate a project id: `<class-id>-<3+ digit sequence>`, e.g. `C01-001`.
///
/// # Errors
/// Returns [`EcoError::InvalidRequest`] on grammar violations.
pub fn validate_project_id(project_id: &str) -> Result<()> {
    let err = || {
        EcoError::InvalidRequest(format!(
            "project id must match the format <class-id>-<sequence>: got {project_id}"
        ))
    };

    let (class_id, seq) = project_id.rsplit_once('-').ok_or_else(err)?;
    validate_class_id(class_id).map_err(|_| err())?;
    if seq.len() < 3 || !seq.chars().all(|c| c.is_ascii_digit()) {
        return Err(err());
    }
    Ok(())
}

/// Format a batch denom from its parent project id, date range, and
/// sequence.
#[must_use]
pub fn format_batch_denom(
    project_id: &str,
    start: NaiveDate,
    end: NaiveDate,
    sequence: u64,
) -> String {
    format!(
        "{project_id}-{}-{}-{sequence:03}",
        start.format("%Y%m%d"),
        end.format("%Y%m%d")
    )
}

/// Validate a batch denom:
/// `<project-id>-<YYYYMMDD>-<YYYYMMDD>-<3+ digit sequence>`,
/// with start date ≤ end date.
///
/// # Errors
/// Returns [`EcoError::InvalidRequest`] on grammar violations.
pub fn validate_batch_denom(denom: &str) -> Result<()> {
    let err = || {
        EcoError::InvalidRequest(format!(
            "batch denom must match the format \
             <project-id>-<start-date>-<end-date>-<sequence>: got {denom}"
        ))
    };

    let mut parts = denom.rsplitn(4, '-');
    let seq = parts.next().ok_or_else(err)?;
    let end = parts.next().ok_or_else(err)?;
    let start = parts.next().ok_or_else(err)?;
    let project_id = parts.next().ok_or_else(err)?;

    validate_project_id(project_id).map_err(|_| err())?;
    let start = parse_compact_date(start).ok_or_else(err)?;
    let end = parse_compact_date(end).ok_or_else(err)?;
    if start > end {
        return Err(EcoError::InvalidRequest(format!(
            "batch denom start date must be on or before end date: got {denom}"
        )));
    }
    if seq.len() < 3 || !seq.chars().all(|c| c.is_ascii_digit()) {
        return Err(err());
    }
    Ok(())
}

fn parse_compact_date(s: &str) -> Option<NaiveDate> {
    if s.len() != 8 || !s.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    NaiveDate::parse_from_str(s, "%Y%m%d").ok()
}

/// Validate a jurisdiction: an ISO-3166-1 alpha-2 country code,
/// optionally `-<subdivision>` (1–3 uppercase alphanumerics), optionally
/// followed by a space and a postal code (1–64 chars of alphanumerics,
/// spaces, and hyphens). A postal code requires a subdivision.
///
/// # Errors
/// Returns [`EcoError::InvalidRequest`] on grammar violations.
pub fn validate_jurisdiction(jurisdiction: &str) -> Result<()> {
    let err = || {
        EcoError::InvalidRequest(format!(
            "jurisdiction must match the format <country-code>[-<region-code>[ <postal-code>]]: \
             got {jurisdiction}"
        ))
    };

    let country_len = 2;
    if !jurisdiction.is_ascii() || jurisdiction.len() < country_len {
        return Err(err());
    }
    let country = &jurisdiction[..country_len];
    if !country.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(err());
    }
    let rest = &jurisdiction[country_len..];
    if rest.is_empty() {
        return Ok(());
    }

    let Some(rest) = rest.strip_prefix('-') else {
        return Err(err());
    };
    let (subdivision, postal) = match rest.split_once(' ') {
        Some((s, p)) => (s, Some(p)),
        None => (rest, None),
    };
    if subdivision.is_empty()
        || subdivision.len() > 3
        || !subdivision
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
    {
        return Err(err());
    }
    if let Some(postal) = postal {
        if postal.is_empty()
            || postal.len() > 64
            || !postal
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == ' ' || c == '-')
        {
            return Err(err());
        }
    }
    Ok(())
}
