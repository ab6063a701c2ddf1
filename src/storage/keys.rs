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

//! Object key layout. Every key starts with the numeric home id, which is
//! what makes per-tenant teardown a single prefix delete.

/// Expiry for signed URLs on non-public containers.
pub const SIGNED_URL_EXPIRY_SECS: u64 = 365 * 24 * 60 * 60;

/// The prefix owning every object of one tenant.
pub fn tenant_prefix(home_id: i32) -> String {
    format!("{home_id}/")
}

pub fn event_image_key(home_id: i32, event_id: &str, ext: &str) -> String {
    format!("{home_id}/events/images/{event_id}.{ext}")
}

pub fn user_photo_key(home_id: i32, user_id: &str, ext: &str) -> String {
    format!("{home_id}/users/photos/{user_id}.{ext}")
}

pub fn instructor_photo_key(home_id: i32, instructor_id: i64, ext: &str) -> String {
    format!("{home_id}/instructors/photos/instructor_{instructor_id}.{ext}")
}

pub fn request_media_key(home_id: i32, request_id: &str, message_id: &str, ext: &str) -> String {
    format!("{home_id}/requests/{request_id}/{message_id}.{ext}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_key_layout() {
        assert_eq!(
            event_image_key(1, "ev42", "jpg"),
            "1/events/images/ev42.jpg"
        );
        assert_eq!(user_photo_key(1, "u7", "jpeg"), "1/users/photos/u7.jpeg");
        assert_eq!(
            instructor_photo_key(2, 5, "png"),
            "2/instructors/photos/instructor_5.png"
        );
        assert_eq!(
            request_media_key(3, "r1", "m9", "mp4"),
            "3/requests/r1/m9.mp4"
        );
    }

    #[test]
    fn test_every_key_is_under_the_tenant_prefix() {
        let prefix = tenant_prefix(7);
        for key in [
            event_image_key(7, "e", "jpg"),
            user_photo_key(7, "u", "jpg"),
            instructor_photo_key(7, 1, "jpg"),
            request_media_key(7, "r", "m", "jpg"),
        ] {
            assert!(key.starts_with(&prefix), "{key}");
        }
    }

    #[test]
    fn test_signed_url_expiry_is_one_year() {
        assert_eq!(SIGNED_URL_EXPIRY_SECS, 31_536_000);
    }
}
