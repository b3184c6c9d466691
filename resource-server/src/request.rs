//! Requests a resource answers and the replies it produces
//!
//! A reply is either ready at once, or in progress. An in-progress reply is
//! backed by a one-shot [`Responder`] that is consumed when it sends, so a
//! deferred response completes at most once.

use resource_model::{ErrorKind, Observer, Representation, ResourceError, Result, SequenceNumber};
use std::sync::mpsc;
use std::time::Duration;

/// Kinds of request a resource understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Init,
    Read,
    Update,
    ObserverRegister,
}

/// A request addressed to one resource
#[derive(Debug, Clone)]
pub enum Request {
    /// Capability handshake; no side effects
    Init,
    Read,
    /// `None` models an update that arrived without a body
    Update(Option<Representation>),
    ObserverRegister(Observer),
}

impl Request {
    pub fn update(fragment: Representation) -> Self {
        Request::Update(Some(fragment))
    }

    pub fn kind(&self) -> RequestKind {
        match self {
            Request::Init => RequestKind::Init,
            Request::Read => RequestKind::Read,
            Request::Update(_) => RequestKind::Update,
            Request::ObserverRegister(_) => RequestKind::ObserverRegister,
        }
    }
}

/// Outcome carried by a response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseOutcome {
    Ok,
    ClientError(String),
    ServerError(String),
    NotFound(String),
}

/// A completed response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub outcome: ResponseOutcome,
    pub representation: Option<Representation>,
    /// Sequence number the representation reflects
    pub sequence: SequenceNumber,
}

impl Response {
    pub fn ok(representation: Option<Representation>, sequence: SequenceNumber) -> Self {
        Self {
            outcome: ResponseOutcome::Ok,
            representation,
            sequence,
        }
    }

    pub fn from_error(err: &ResourceError, sequence: SequenceNumber) -> Self {
        let detail = err.detail().to_string();
        let outcome = match err.kind() {
            ErrorKind::Validation => ResponseOutcome::ClientError(detail),
            ErrorKind::NotFound => ResponseOutcome::NotFound(detail),
            ErrorKind::Transport | ErrorKind::Internal => ResponseOutcome::ServerError(detail),
        };
        Self {
            outcome,
            representation: None,
            sequence,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.outcome == ResponseOutcome::Ok
    }

    /// Convert into the representation on success or the matching error
    pub fn into_result(self) -> Result<(Option<Representation>, SequenceNumber)> {
        match self.outcome {
            ResponseOutcome::Ok => Ok((self.representation, self.sequence)),
            ResponseOutcome::ClientError(msg) => Err(ResourceError::Validation(msg)),
            ResponseOutcome::ServerError(msg) => Err(ResourceError::Internal(msg)),
            ResponseOutcome::NotFound(msg) => Err(ResourceError::NotFound(msg)),
        }
    }
}

/// What a resource hands back for a request
#[derive(Debug)]
pub enum HandlerReply {
    Ready(Response),
    InProgress(DeferredResponse),
}

impl HandlerReply {
    /// Block until the response is available
    ///
    /// Ready replies return immediately; in-progress replies wait up to
    /// `timeout` for the worker to complete them.
    pub fn wait(self, timeout: Duration) -> Result<Response> {
        match self {
            HandlerReply::Ready(response) => Ok(response),
            HandlerReply::InProgress(deferred) => deferred.wait(timeout),
        }
    }
}

/// Receiving side of a deferred response
#[derive(Debug)]
pub struct DeferredResponse {
    rx: mpsc::Receiver<Response>,
}

/// Completing side of a deferred response
#[derive(Debug)]
pub struct Responder {
    tx: mpsc::SyncSender<Response>,
}

/// Create a linked responder and deferred response
pub fn deferred() -> (Responder, DeferredResponse) {
    let (tx, rx) = mpsc::sync_channel(1);
    (Responder { tx }, DeferredResponse { rx })
}

impl Responder {
    /// Complete the response; dropped silently if the requester gave up
    pub fn send(self, response: Response) {
        if self.tx.send(response).is_err() {
            tracing::debug!("Deferred response discarded; requester went away");
        }
    }
}

impl DeferredResponse {
    pub fn wait(self, timeout: Duration) -> Result<Response> {
        self.rx.recv_timeout(timeout).map_err(|e| match e {
            mpsc::RecvTimeoutError::Timeout => {
                ResourceError::Transport(format!("no response within {:?}", timeout))
            }
            mpsc::RecvTimeoutError::Disconnected => {
                ResourceError::Internal("deferred response abandoned".to_string())
            }
        })
    }

    pub fn try_take(&self) -> Option<Response> {
        self.rx.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ResourceError::Validation("bad".into()), ResponseOutcome::ClientError("bad".into()))]
    #[case(ResourceError::NotFound("gone".into()), ResponseOutcome::NotFound("gone".into()))]
    #[case(ResourceError::Internal("boom".into()), ResponseOutcome::ServerError("boom".into()))]
    fn test_error_outcome_mapping(#[case] err: ResourceError, #[case] outcome: ResponseOutcome) {
        let response = Response::from_error(&err, SequenceNumber::ZERO);
        assert_eq!(response.outcome, outcome);
        assert_eq!(response.into_result().unwrap_err(), err);
    }

    #[test]
    fn test_deferred_completes_once() {
        let (responder, pending) = deferred();
        assert!(pending.try_take().is_none());

        std::thread::spawn(move || {
            responder.send(Response::ok(None, SequenceNumber::new(3)));
        });

        let response = pending.wait(Duration::from_secs(2)).unwrap();
        assert_eq!(response.sequence, SequenceNumber::new(3));
    }

    #[test]
    fn test_abandoned_responder_is_internal_error() {
        let (responder, pending) = deferred();
        drop(responder);
        assert!(matches!(
            pending.wait(Duration::from_millis(50)),
            Err(ResourceError::Internal(_))
        ));
    }

    #[test]
    fn test_request_kinds() {
        assert_eq!(Request::Init.kind(), RequestKind::Init);
        assert_eq!(Request::update(Representation::new()).kind(), RequestKind::Update);
    }
}
