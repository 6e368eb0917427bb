use super::request::SearchRequest;
use super::store::ResultSink;
use crate::cancel::CancellationToken;
use crate::error::Result;
use crate::expression::DocRef;

/// Produces the rows for a search. Implemented by whatever scans and
/// aggregates the underlying data.
pub trait SearchProvider: Send + Sync {
    /// Checks a new request before a store is created for it. An error here
    /// fails the first request outright.
    fn prepare(&self, _request: &SearchRequest) -> Result<()> {
        Ok(())
    }

    /// Field holding the partition time of `data_source`. When present, the
    /// query's time range is added to the expression as terms on this field.
    fn time_field(&self, _data_source: &DocRef) -> Option<String> {
        None
    }

    /// Runs the search on a worker thread, streaming into `sink` until done
    /// or until `cancel` fires.
    fn execute(
        &self,
        request: &SearchRequest,
        sink: &ResultSink,
        cancel: &CancellationToken,
    ) -> Result<()>;
}
