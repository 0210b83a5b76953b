//! Helper macro for declaring driven-port error enums.
//!
//! Each variant gets a `thiserror` message and a snake_case constructor whose
//! parameters accept anything convertible into the field type, so adapters
//! can write `ListingRepositoryError::connection(err.to_string())` or pass a
//! `&str` directly.

macro_rules! define_port_error {
    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($field:ident : $ty:ty),* $(,)? } )? => $message:expr
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant $( { $($field : $ty),* } )?,
            )*
        }

        impl $name {
            $(
                define_port_error!(@constructor $variant $( { $($field : $ty),* } )?);
            )*
        }
    };

    (@constructor $variant:ident) => {
        ::paste::paste! {
            #[doc = concat!("Build the `", stringify!($variant), "` variant.")]
            #[must_use]
            pub const fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };

    (@constructor $variant:ident { $($field:ident : $ty:ty),* }) => {
        ::paste::paste! {
            #[doc = concat!("Build the `", stringify!($variant), "` variant.")]
            #[must_use]
            pub fn [<$variant:snake>]($($field: impl Into<$ty>),*) -> Self {
                Self::$variant { $($field: $field.into()),* }
            }
        }
    };
}

pub(crate) use define_port_error;

#[cfg(test)]
mod tests {
    //! Generated constructors and messages.
    define_port_error! {
        pub enum SamplePortError {
            Offline => "sample backend offline",
            Rejected { message: String } => "sample backend rejected: {message}",
            Throttled { message: String, retry_after_secs: u32 } =>
                "sample backend throttled for {retry_after_secs}s: {message}",
        }
    }

    #[test]
    fn unit_variants_get_const_constructors() {
        const ERR: SamplePortError = SamplePortError::offline();
        assert_eq!(ERR.to_string(), "sample backend offline");
    }

    #[test]
    fn string_fields_accept_str() {
        let err = SamplePortError::rejected("bad shape");
        assert_eq!(err.to_string(), "sample backend rejected: bad shape");
    }

    #[test]
    fn mixed_fields_keep_their_types() {
        let err = SamplePortError::throttled("slow down", 5_u32);
        assert_eq!(
            err,
            SamplePortError::Throttled {
                message: "slow down".to_owned(),
                retry_after_secs: 5
            }
        );
    }
}
