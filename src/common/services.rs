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
use rand::RngExt;
use rand::distr::Alphanumeric;

/// Alphanumeric string from the thread-local CSPRNG. Used for generated
/// tenant database passwords.
pub fn generate_string_csprng(len: usize) -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_string_has_requested_length() {
        assert_eq!(generate_string_csprng(40).len(), 40);
        assert_eq!(generate_string_csprng(0).len(), 0);
    }

    #[test]
    fn test_generated_strings_differ() {
        assert_ne!(generate_string_csprng(32), generate_string_csprng(32));
    }
}
