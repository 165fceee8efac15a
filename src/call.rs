use ozcore::event::{Headers, Offer};
use ozcore::message::Correlation;
use serde::Serialize;

/// A call announced by an offer, handed to the application on the new-call
/// channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallContext {
    pub call_id: String,
    pub to: String,
    pub from: Option<String>,
    pub headers: Headers,
}

impl CallContext {
    pub fn from_offer(call_id: impl Into<String>, offer: Offer) -> Self {
        Self {
            call_id: call_id.into(),
            to: offer.to,
            from: offer.from,
            headers: offer.headers,
        }
    }

    /// Correlation for commands issued on this call.
    pub fn correlation(&self) -> Correlation {
        Correlation::call(self.call_id.clone())
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}
