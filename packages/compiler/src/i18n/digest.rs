//! Stable identifier generation.
//!
//! The id for a unit is a 64-bit fingerprint of its canonical content plus
//! its context, rendered as exactly twelve base-62 characters. The
//! fingerprint runs two dependent 32-bit passes over the input, so the id is
//! stable across runs, machines and file orderings.

use super::unit::ContextPath;

pub const ID_LEN: usize = 12;

const BASE62: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Compute the identifier for a unit from its canonical content and context.
pub fn generate(canonical: &str, context: &ContextPath) -> String {
    let input = format!("{}::{}::{}", canonical, context.scope, context.file);
    encode_base62(fingerprint(&input))
}

/// Whether a string has the shape of a generated identifier.
pub fn is_valid_id(id: &str) -> bool {
    id.len() == ID_LEN && id.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// 64-bit fingerprint built from two related 32-bit hashes of the input.
pub fn fingerprint(s: &str) -> u64 {
    let utf8 = s.as_bytes();
    let mut hi = hash32(utf8, 0);
    let mut lo = hash32(utf8, 102072);

    if hi == 0 && (lo == 0 || lo == 1) {
        hi ^= 0x130f9bef;
        lo ^= 0x949a74d4_u32.wrapping_neg();
    }

    ((hi as u64) << 32) | (lo as u64)
}

/// Render a 64-bit value as twelve base-62 digits, left-padded with `0`.
fn encode_base62(mut value: u64) -> String {
    let mut buf = [b'0'; ID_LEN];
    let mut index = ID_LEN;
    while value > 0 && index > 0 {
        index -= 1;
        buf[index] = BASE62[(value % 62) as usize];
        value /= 62;
    }
    // 62^12 > 2^64, so every u64 fits.
    String::from_utf8_lossy(&buf).into_owned()
}

fn hash32(bytes: &[u8], mut c: u32) -> u32 {
    let length = bytes.len();
    let mut a = 0x9e3779b9u32;
    let mut b = 0x9e3779b9u32;
    let mut index = 0;

    while index + 12 <= length {
        a = a.wrapping_add(read_u32_le(bytes, index));
        b = b.wrapping_add(read_u32_le(bytes, index + 4));
        c = c.wrapping_add(read_u32_le(bytes, index + 8));
        let (na, nb, nc) = mix(a, b, c);
        a = na;
        b = nb;
        c = nc;
        index += 12;
    }

    let remainder = length - index;
    c = c.wrapping_add(length as u32);

    if remainder >= 4 {
        a = a.wrapping_add(read_u32_le(bytes, index));
        index += 4;
        if remainder >= 8 {
            b = b.wrapping_add(read_u32_le(bytes, index));
            index += 4;
            if remainder >= 9 {
                c = c.wrapping_add((read_u8(bytes, index) as u32) << 8);
                index += 1;
            }
            if remainder >= 10 {
                c = c.wrapping_add((read_u8(bytes, index) as u32) << 16);
                index += 1;
            }
            if remainder == 11 {
                c = c.wrapping_add((read_u8(bytes, index) as u32) << 24);
            }
        } else {
            if remainder >= 5 {
                b = b.wrapping_add(read_u8(bytes, index) as u32);
                index += 1;
            }
            if remainder >= 6 {
                b = b.wrapping_add((read_u8(bytes, index) as u32) << 8);
                index += 1;
            }
            if remainder == 7 {
                b = b.wrapping_add((read_u8(bytes, index) as u32) << 16);
            }
        }
    } else {
        if remainder >= 1 {
            a = a.wrapping_add(read_u8(bytes, index) as u32);
            index += 1;
        }
        if remainder >= 2 {
            a = a.wrapping_add((read_u8(bytes, index) as u32) << 8);
            index += 1;
        }
        if remainder == 3 {
            a = a.wrapping_add((read_u8(bytes, index) as u32) << 16);
        }
    }

    mix(a, b, c).2
}

fn mix(mut a: u32, mut b: u32, mut c: u32) -> (u32, u32, u32) {
    a = a.wrapping_sub(b);
    a = a.wrapping_sub(c);
    a ^= c >> 13;
    b = b.wrapping_sub(c);
    b = b.wrapping_sub(a);
    b ^= a << 8;
    c = c.wrapping_sub(a);
    c = c.wrapping_sub(b);
    c ^= b >> 13;
    a = a.wrapping_sub(b);
    a = a.wrapping_sub(c);
    a ^= c >> 12;
    b = b.wrapping_sub(c);
    b = b.wrapping_sub(a);
    b ^= a << 16;
    c = c.wrapping_sub(a);
    c = c.wrapping_sub(b);
    c ^= b >> 5;
    a = a.wrapping_sub(b);
    a = a.wrapping_sub(c);
    a ^= c >> 3;
    b = b.wrapping_sub(c);
    b = b.wrapping_sub(a);
    b ^= a << 10;
    c = c.wrapping_sub(a);
    c = c.wrapping_sub(b);
    c ^= b >> 15;
    (a, b, c)
}

fn read_u8(bytes: &[u8], index: usize) -> u8 {
    if index >= bytes.len() {
        0
    } else {
        bytes[index]
    }
}

fn read_u32_le(bytes: &[u8], index: usize) -> u32 {
    (read_u8(bytes, index) as u32)
        | ((read_u8(bytes, index + 1) as u32) << 8)
        | ((read_u8(bytes, index + 2) as u32) << 16)
        | ((read_u8(bytes, index + 3) as u32) << 24)
}
