//! Test utilities for the discovery crate.
//!
//! This module provides shared helpers for both unit tests (in `src/`) and
//! integration tests (in `tests/`). It is only compiled for tests or when the
//! `test-support` feature is enabled.

pub mod cap_fs {
    //! Capability-safe filesystem helpers for tests.
    //!
    //! The crate forbids direct `std::fs` calls. These helpers build on
    //! `cap_std::fs::Dir` so test suites share policy-compliant file access.

    use std::ffi::OsString;
    use std::io;
    use std::path::Path;

    use cap_std::{ambient_authority, fs::Dir};

    /// Read a UTF-8 text file through `cap_std`.
    pub fn read_file_to_string(path: &Path) -> io::Result<String> {
        let (parent, file_name) = parent_and_file_name(path)?;
        let directory = Dir::open_ambient_dir(parent, ambient_authority())?;
        directory.read_to_string(Path::new(&file_name))
    }

    /// Write bytes to a file through `cap_std`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use discovery::test_support::cap_fs::{read_file_to_string, write_file};
    ///
    /// let path = std::env::temp_dir().join("cap-fs-write-example.txt");
    /// write_file(&path, b"[]\n")?;
    /// assert_eq!(read_file_to_string(&path)?, "[]\n");
    /// # Ok::<(), std::io::Error>(())
    /// ```
    pub fn write_file(path: &Path, contents: &[u8]) -> io::Result<()> {
        let (parent, file_name) = parent_and_file_name(path)?;
        let directory = Dir::open_ambient_dir(parent, ambient_authority())?;
        directory.write(Path::new(&file_name), contents)
    }

    fn parent_and_file_name(path: &Path) -> io::Result<(&Path, OsString)> {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        let file_name = path.file_name().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                "path must include a file name",
            )
        })?;
        Ok((parent, file_name.to_os_string()))
    }
}

pub mod clock {
    //! A clock tests can move forward by hand.

    use std::sync::{Mutex, PoisonError};
    use std::time::Duration;

    use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};

    /// Clock frozen at an instant until a test advances it.
    #[derive(Debug)]
    pub struct MutableClock {
        now: Mutex<DateTime<Utc>>,
    }

    impl MutableClock {
        /// Clock frozen at `instant`.
        #[must_use]
        pub const fn at(instant: DateTime<Utc>) -> Self {
            Self {
                now: Mutex::new(instant),
            }
        }

        /// Move the clock forward.
        pub fn advance(&self, by: Duration) {
            let delta = TimeDelta::from_std(by).unwrap_or(TimeDelta::MAX);
            let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
            *now = now.checked_add_signed(delta).unwrap_or(DateTime::<Utc>::MAX_UTC);
        }

        /// Jump to `instant`.
        pub fn set(&self, instant: DateTime<Utc>) {
            *self.now.lock().unwrap_or_else(PoisonError::into_inner) = instant;
        }
    }

    impl Default for MutableClock {
        /// Frozen at 2026-03-01T12:00:00Z.
        fn default() -> Self {
            let instant = Utc
                .with_ymd_and_hms(2026, 3, 1, 12, 0, 0)
                .single()
                .unwrap_or(DateTime::<Utc>::UNIX_EPOCH);
            Self::at(instant)
        }
    }

    impl mockable::Clock for MutableClock {
        fn local(&self) -> DateTime<Local> {
            self.utc().with_timezone(&Local)
        }

        fn utc(&self) -> DateTime<Utc> {
            *self.now.lock().unwrap_or_else(PoisonError::into_inner)
        }
    }
}

pub mod listings {
    //! Listing builders and an instrumented store for HTTP-level tests.

    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::{DateTime, Utc};

    use crate::domain::ports::{ListingRepository, ListingRepositoryError};
    use crate::domain::{
        GeoPoint, ListingFilters, ListingId, ListingProjection, ListingStatus, ModerationStatus,
    };
    use crate::outbound::memory::InMemoryListingRepository;

    /// Active, approved listing with a price in BYN.
    #[must_use]
    pub fn listing(
        id: &str,
        location: GeoPoint,
        created_at: DateTime<Utc>,
        price: Option<f64>,
    ) -> ListingProjection {
        ListingProjection {
            id: ListingId::new(id),
            title: format!("Listing {id}"),
            price,
            currency: "BYN".to_owned(),
            category_id: "electronics".to_owned(),
            subcategory_id: None,
            created_at,
            status: ListingStatus::Active,
            moderation_status: ModerationStatus::Approved,
            location,
            photos: Vec::new(),
        }
    }

    /// In-memory listing store that counts how often it is queried.
    #[derive(Debug, Default)]
    pub struct CountingListingRepository {
        inner: InMemoryListingRepository,
        calls: AtomicUsize,
    }

    impl CountingListingRepository {
        /// Wrap a seeded in-memory store.
        #[must_use]
        pub const fn new(inner: InMemoryListingRepository) -> Self {
            Self {
                inner,
                calls: AtomicUsize::new(0),
            }
        }

        /// Underlying store, for seeding between requests.
        #[must_use]
        pub const fn inner(&self) -> &InMemoryListingRepository {
            &self.inner
        }

        /// Number of candidate queries served so far.
        #[must_use]
        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ListingRepository for CountingListingRepository {
        fn supports_proximity(&self) -> bool {
            self.inner.supports_proximity()
        }

        async fn find_active_listings_near(
            &self,
            center: GeoPoint,
            radius_km: f64,
            filters: &ListingFilters,
        ) -> Result<Vec<ListingProjection>, ListingRepositoryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner
                .find_active_listings_near(center, radius_km, filters)
                .await
        }

        async fn find_active_listings(
            &self,
            filters: &ListingFilters,
            limit: usize,
        ) -> Result<Vec<ListingProjection>, ListingRepositoryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.find_active_listings(filters, limit).await
        }
    }
}

pub use clock::MutableClock;
