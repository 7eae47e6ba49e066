//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `migrations/` exactly. Regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Registered accounts.
    users (id) {
        id -> Uuid,
        /// Unique, trimmed login (max 64 characters).
        login -> Varchar,
        /// Salted SHA-256 digest, `salt$digest` in hex.
        password_hash -> Text,
        /// `user` or `moderator`.
        role -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Panel catalogue.
    panels (id) {
        id -> Uuid,
        title -> Varchar,
        panel_type -> Varchar,
        /// Rated output in watts.
        power -> Float8,
        /// Width in millimetres.
        width -> Int4,
        /// Height in millimetres.
        height -> Int4,
        image -> Nullable<Text>,
        is_deleted -> Bool,
    }
}

diesel::table! {
    /// Calculation requests.
    ///
    /// A partial unique index keeps at most one `draft` row per creator.
    solar_requests (id) {
        id -> Uuid,
        creator_id -> Uuid,
        moderator_id -> Nullable<Uuid>,
        status -> Varchar,
        insolation -> Float8,
        total_power -> Nullable<Float8>,
        created_at -> Timestamptz,
        formed_at -> Nullable<Timestamptz>,
        moderated_at -> Nullable<Timestamptz>,
        deleted_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    /// Line items keyed by `(request_id, panel_id)`.
    request_items (request_id, panel_id) {
        request_id -> Uuid,
        panel_id -> Uuid,
        /// Surface area in square metres.
        area -> Float8,
    }
}

diesel::joinable!(request_items -> panels (panel_id));
diesel::joinable!(request_items -> solar_requests (request_id));

diesel::allow_tables_to_appear_in_same_query!(users, panels, solar_requests, request_items);
