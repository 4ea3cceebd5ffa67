//! Response nonces: a UTC timestamp followed by a random salt.
//!
//! ```text
//! 2005-05-15T17:11:51ZUNIQUE
//! ^^^^^^^^^^^^^^^^^^^^
//!  20-char timestamp  ^^^^^^ salt (letters and digits)
//! ```
//!
//! This module only checks structure and freshness. Remembering which nonces
//! were already used is the job of a nonce store.

use chrono::{DateTime, Datelike, NaiveDateTime, Utc};
use rand::rngs::OsRng;
use rand::{CryptoRng, Rng, RngCore};

/// Default allowed clock skew: five hours.
///
/// Covers clock drift plus the whole redirect round-trip of an
/// authentication; storing nonces for that long is cheap.
pub const SKEW: i64 = 60 * 60 * 5;

/// Default salt length.
pub const DEFAULT_SALT_LENGTH: usize = 6;

/// Characters a salt is drawn from.
pub const NONCE_CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Width of the timestamp prefix.
pub const TIME_STR_LEN: usize = "0000-00-00T00:00:00Z".len();

/// Errors that can occur when decoding a nonce.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum NonceError {
    /// The nonce does not start with a `YYYY-MM-DDTHH:MM:SSZ` timestamp.
    #[error("nonce does not start with a UTC timestamp")]
    MalformedTimestamp,

    /// The timestamp is before the Unix epoch or does not fit the format.
    #[error("time out of range")]
    OutOfRange,
}

/// Split a nonce into its Unix timestamp and salt.
///
/// # Errors
///
/// - [`NonceError::MalformedTimestamp`] if the first 20 characters are not a timestamp
/// - [`NonceError::OutOfRange`] if the timestamp is negative
pub fn split(nonce: &str) -> Result<(i64, &str), NonceError> {
    let stamp = nonce
        .get(..TIME_STR_LEN)
        .ok_or(NonceError::MalformedTimestamp)?;
    if !has_timestamp_shape(stamp) {
        return Err(NonceError::MalformedTimestamp);
    }
    let parsed = NaiveDateTime::parse_from_str(stamp, TIME_FORMAT)
        .map_err(|_| NonceError::MalformedTimestamp)?;
    let timestamp = parsed.and_utc().timestamp();
    if timestamp < 0 {
        return Err(NonceError::OutOfRange);
    }
    Ok((timestamp, &nonce[TIME_STR_LEN..]))
}

/// Digits and separators in the fixed positions of the timestamp.
fn has_timestamp_shape(stamp: &str) -> bool {
    stamp.bytes().enumerate().all(|(i, b)| match i {
        4 | 7 => b == b'-',
        10 => b == b'T',
        13 | 16 => b == b':',
        19 => b == b'Z',
        _ => b.is_ascii_digit(),
    })
}

/// Whether the nonce's timestamp lies within `allowed_skew` seconds of `now`.
///
/// Both bounds are inclusive. Malformed nonces yield `false`.
#[must_use]
pub fn check_timestamp(nonce: &str, allowed_skew: i64, now: i64) -> bool {
    let Ok((stamp, _)) = split(nonce) else {
        return false;
    };
    let past = now.saturating_sub(allowed_skew);
    let future = now.saturating_add(allowed_skew);
    past <= stamp && stamp <= future
}

/// [`check_timestamp`] against the current time with the default [`SKEW`].
#[must_use]
pub fn check_timestamp_now(nonce: &str) -> bool {
    check_timestamp(nonce, SKEW, Utc::now().timestamp())
}

/// Random salt of `length` characters from [`NONCE_CHARS`].
#[must_use]
pub fn make_nonce_salt<R: RngCore + CryptoRng>(length: usize, rng: &mut R) -> String {
    (0..length)
        .map(|_| char::from(NONCE_CHARS[rng.gen_range(0..NONCE_CHARS.len())]))
        .collect()
}

/// Create a nonce for `when` (default: now) with a salt from the OS RNG.
///
/// # Errors
///
/// Returns [`NonceError::OutOfRange`] if `when` is before the epoch or past
/// year 9999.
pub fn mk_nonce(when: Option<i64>) -> Result<String, NonceError> {
    mk_nonce_with_rng(when, DEFAULT_SALT_LENGTH, &mut OsRng)
}

/// Create a nonce with an explicit salt length and RNG.
///
/// # Errors
///
/// Same as [`mk_nonce`].
pub fn mk_nonce_with_rng<R: RngCore + CryptoRng>(
    when: Option<i64>,
    salt_length: usize,
    rng: &mut R,
) -> Result<String, NonceError> {
    let time = match when {
        None => Utc::now(),
        Some(t) => DateTime::<Utc>::from_timestamp(t, 0)
            .filter(|_| t >= 0)
            .filter(|time| time.year() <= 9999)
            .ok_or(NonceError::OutOfRange)?,
    };
    Ok(mk_nonce_at(time, salt_length, rng))
}

/// Create a nonce for an already validated instant.
#[must_use]
pub fn mk_nonce_at<R: RngCore + CryptoRng>(
    time: DateTime<Utc>,
    salt_length: usize,
    rng: &mut R,
) -> String {
    let mut nonce = time.format(TIME_FORMAT).to_string();
    nonce.push_str(&make_nonce_salt(salt_length, rng));
    nonce
}
