//! Diesel schema for managed server persistence.

diesel::table! {
    /// Managed server records.
    servers (id) {
        /// Internal server identifier.
        id -> Uuid,
        /// Owning project identifier.
        project_id -> Uuid,
        /// Human-readable server name.
        #[max_length = 255]
        name -> Varchar,
        /// Login identity on the target.
        #[max_length = 255]
        login_user -> Nullable<Varchar>,
        /// Host name or address.
        #[max_length = 255]
        ip_address -> Nullable<Varchar>,
        /// Deploy root as supplied.
        path -> Nullable<Text>,
        /// SSH port.
        port -> Nullable<Int4>,
        /// Whether code is deployed to this server.
        deploy_code -> Bool,
        /// Ordering within the project.
        sort_order -> Int4,
        /// Verification status (`successful`, `untested`, `failed`, `testing`).
        #[max_length = 50]
        status -> Varchar,
        /// Output of the last verification.
        output -> Nullable<Text>,
        /// Revision counter used for conditional writes.
        version -> Int8,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
        /// Soft-deletion timestamp.
        deleted_at -> Nullable<Timestamptz>,
    }
}
