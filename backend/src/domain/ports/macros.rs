//! `define_port_error!`: error enums for driven ports.
//!
//! Each variant names the [`ErrorCode`](crate::domain::ErrorCode) it surfaces
//! as, so services lift adapter failures with `Error::from` instead of a
//! hand-written match per port:
//!
//! ```ignore
//! define_port_error! {
//!     pub enum RequestItemRepositoryError {
//!         Duplicate { message: String } => Conflict, "request item already exists: {message}",
//!         Query { message: String } => InternalError, "query failed: {message}",
//!     }
//! }
//! ```
//!
//! Every variant carries named fields. Constructors take `impl Into<_>` per
//! field. Conversions into `InternalError` are logged at error level with the
//! port name; the HTTP layer redacts their text.

macro_rules! define_port_error {
    (@ctor $variant:ident ($($params:tt)*) ($($inits:tt)*)) => {
        ::paste::paste! {
            pub fn [<$variant:snake>]($($params)*) -> Self {
                Self::$variant { $($inits)* }
            }
        }
    };

    (@ctor $variant:ident ($($params:tt)*) ($($inits:tt)*) $field:ident : $ty:ty, $($rest:tt)*) => {
        define_port_error!(
            @ctor
            $variant
            ($($params)* $field: impl Into<$ty>,)
            ($($inits)* $field: $field.into(),)
            $($rest)*
        );
    };

    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident { $($field:ident : $ty:ty),* $(,)? } => $code:ident, $message:expr
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant { $($field : $ty),* },
            )*
        }

        impl $name {
            $(
                define_port_error!(@ctor $variant () () $( $field : $ty, )*);
            )*

            /// Category this failure surfaces as once it leaves the port.
            pub const fn code(&self) -> $crate::domain::ErrorCode {
                match self {
                    $( Self::$variant { .. } => $crate::domain::ErrorCode::$code, )*
                }
            }
        }

        impl From<$name> for $crate::domain::Error {
            fn from(err: $name) -> Self {
                let code = err.code();
                if code == $crate::domain::ErrorCode::InternalError {
                    ::tracing::error!(port = stringify!($name), error = %err, "port failure");
                }
                $crate::domain::Error::new(code, err.to_string())
            }
        }
    };
}

pub(crate) use define_port_error;
