//! Chroot selection.
//!
//! Copr's list of supported chroots changes whenever a distribution release
//! is added or retired. The filter picks the chroots a snapshot cares about
//! and always returns them sorted, so the same input set yields the same
//! output no matter what order Copr listed them in.

use regex::Regex;

use crate::Result;

/// Default pattern for the chroots a snapshot is built for.
pub const DEFAULT_CHROOT_PATTERN: &str = r"^(fedora-(rawhide|[0-9]+)|rhel-[8,9]-)";

/// A compiled chroot pattern, anchored at the start of the chroot name.
#[derive(Debug, Clone)]
pub struct ChrootFilter {
    pattern: String,
    regex: Regex,
}

impl ChrootFilter {
    /// Compile `pattern`. Fails with [`crate::CoprError::Pattern`] if it is malformed.
    pub fn new(pattern: &str) -> Result<Self> {
        let regex = Regex::new(&format!("^(?:{pattern})"))?;
        Ok(ChrootFilter {
            pattern: pattern.to_string(),
            regex,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn is_match(&self, chroot: &str) -> bool {
        self.regex.is_match(chroot)
    }

    /// Matching chroots, sorted ascending. Duplicates in the input are kept.
    pub fn apply<I, S>(&self, chroots: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut res: Vec<String> = chroots
            .into_iter()
            .filter(|chroot| self.is_match(chroot.as_ref()))
            .map(|chroot| chroot.as_ref().to_string())
            .collect();
        res.sort();
        res
    }
}

/// Return the chroots matching `pattern`, sorted ascending.
///
/// The pattern is compiled before anything is matched, so a malformed
/// pattern never produces a partial result.
pub fn filter_chroots<I, S>(chroots: I, pattern: &str) -> Result<Vec<String>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    Ok(ChrootFilter::new(pattern)?.apply(chroots))
}
