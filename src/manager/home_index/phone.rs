/*
 * This file is part of the Residents backend.
 *
 * Copyright (C) 2025 Kovács Dávid <kapcsolat@kovacsdavid.dev>
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as published
 * by the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

use regex::Regex;
use std::sync::LazyLock;

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9]+$").expect("phone regex"));

/// Digits with an optional `+` prefix.
pub fn is_valid_phone(phone: &str) -> bool {
    PHONE_RE.is_match(phone)
}

/// Normalizes a phone number for home_index storage and lookup: leading
/// zeros are stripped, a `+` prefix is left untouched (a leading `+0` keeps
/// its zero). Idempotent; applied on both write and read so the two sides
/// can never disagree.
pub fn normalize_phone(phone: &str) -> String {
    if phone.starts_with('+') {
        return phone.to_string();
    }
    let stripped = phone.trim_start_matches('0');
    // all-zero input keeps nothing
    stripped.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_leading_zero_is_stripped() {
        assert_eq!(normalize_phone("0541111666"), "541111666");
        assert_eq!(normalize_phone("541111666"), "541111666");
    }

    #[test]
    fn test_plus_prefix_is_untouched() {
        assert_eq!(normalize_phone("+972541111666"), "+972541111666");
        assert_eq!(normalize_phone("+0541111666"), "+0541111666");
    }

    #[test]
    fn test_phone_validation() {
        assert!(is_valid_phone("0541111666"));
        assert!(is_valid_phone("+972541111666"));
        assert!(!is_valid_phone("+"));
        assert!(!is_valid_phone("054-111"));
        assert!(!is_valid_phone(""));
        assert!(!is_valid_phone("54 111"));
    }

    #[test]
    fn test_idempotence() {
        for phone in ["0541111666", "00123", "541111666", "+0541111666", "0", ""] {
            assert_eq!(
                normalize_phone(&normalize_phone(phone)),
                normalize_phone(phone),
                "{phone}"
            );
        }
    }
}
