//! Options for [`Reader`] and [`Writer`].
//!
//! [`Reader`]: crate::Reader
//! [`Writer`]: crate::Writer

/// Options controlling how strictly an archive is read.
///
/// # Example
///
/// ```
/// use ar_stream::ReaderOptions;
///
/// let options = ReaderOptions {
///     max_entry_size: 64 * 1024 * 1024,
///     ..Default::default()
/// };
/// assert!(!options.verify_padding);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderOptions {
    /// Require the pad byte after odd-sized payloads to be `\n`.
    ///
    /// Off by default: the pad byte is skipped without looking at it.
    pub verify_padding: bool,

    /// Largest accepted entry size in bytes.
    ///
    /// Headers declaring more yield [`ArchiveError::EntryTooLarge`].
    ///
    /// Default: no limit.
    ///
    /// [`ArchiveError::EntryTooLarge`]: crate::ArchiveError::EntryTooLarge
    pub max_entry_size: u64,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            verify_padding: false,
            max_entry_size: u64::MAX,
        }
    }
}

impl ReaderOptions {
    /// Create options with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Options for untrusted input: padding is checked and entries are
    /// capped at 1 GiB.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            verify_padding: true,
            max_entry_size: 1024 * 1024 * 1024,
        }
    }
}

/// How [`Writer`] enforces the size declared in a header.
///
/// [`Writer`]: crate::Writer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SizeCheck {
    /// Reject any write that would take the entry past its declared size.
    #[default]
    RunningTotal,

    /// Compare each write against the declared size on its own.
    ///
    /// Several small writes may together exceed the size; the excess bytes
    /// are passed to the sink and the entry is treated as complete.
    PerCall,
}

/// Options controlling how an archive is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriterOptions {
    /// Write-limit policy.
    pub size_check: SizeCheck,

    /// Refuse to start a new header, or finish the archive, while the
    /// current entry still has bytes to be written.
    pub require_complete_entries: bool,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            size_check: SizeCheck::RunningTotal,
            require_complete_entries: true,
        }
    }
}

impl WriterOptions {
    /// Create options with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Per-call size checks and no completeness tracking.
    ///
    /// Only the caller keeps the archive consistent in this mode.
    #[must_use]
    pub fn permissive() -> Self {
        Self {
            size_check: SizeCheck::PerCall,
            require_complete_entries: false,
        }
    }
}
