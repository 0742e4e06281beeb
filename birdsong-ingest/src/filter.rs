use birdsong_core::config::TwitterConfig;

use crate::error::{IngestError, Result};

/// Static filter a subscription is opened with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamFilter {
    follow: Vec<String>,
    track: Vec<String>,
}

impl StreamFilter {
    /// Build a filter from account ids and optional keywords
    ///
    /// Blank entries are discarded. A follow list with no ids left is a
    /// configuration error.
    pub fn new<F, T>(follow: F, track: T) -> Result<Self>
    where
        F: IntoIterator,
        F::Item: Into<String>,
        T: IntoIterator,
        T::Item: Into<String>,
    {
        let follow = clean(follow);
        if follow.is_empty() {
            return Err(IngestError::Configuration(
                "follow list must contain at least one account id".to_string(),
            ));
        }

        Ok(Self {
            follow,
            track: clean(track),
        })
    }

    pub fn from_config(config: &TwitterConfig) -> Result<Self> {
        Self::new(config.follow.iter().cloned(), config.track.iter().cloned())
    }

    #[must_use]
    pub fn follow(&self) -> &[String] {
        &self.follow
    }

    #[must_use]
    pub fn track(&self) -> &[String] {
        &self.track
    }

    /// Request parameters in the form the filter endpoint expects
    #[must_use]
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("follow", self.follow.join(","))];
        if !self.track.is_empty() {
            params.push(("track", self.track.join(",")));
        }
        params
    }
}

fn clean<I>(items: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: Into<String>,
{
    items
        .into_iter()
        .map(|item| item.into().trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_follow_list_is_configuration_error() {
        let err = StreamFilter::new(Vec::<String>::new(), ["bird"]).unwrap_err();
        assert!(matches!(err, IngestError::Configuration(_)));

        let err = StreamFilter::new(["", "  "], Vec::<String>::new()).unwrap_err();
        assert!(matches!(err, IngestError::Configuration(_)));
    }

    #[test]
    fn test_params() {
        let filter = StreamFilter::new([" 783214", "6253282 "], Vec::<String>::new()).unwrap();
        assert_eq!(filter.params(), vec![("follow", "783214,6253282".to_string())]);

        let filter = StreamFilter::new(["783214"], ["bird", ""]).unwrap();
        assert_eq!(
            filter.params(),
            vec![
                ("follow", "783214".to_string()),
                ("track", "bird".to_string())
            ]
        );
    }
}
