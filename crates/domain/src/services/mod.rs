//! Domain services for the wedding RSVP backend.
//!
//! Services contain the flows that combine domain models with the document store.

pub mod gate;
pub mod live;
pub mod rsvp;

pub use gate::{open_invitation, CodeLists, GateError, InvitationAccess};
pub use live::{
    load_dashboard, load_registry, load_responses, watch_dashboard, watch_invitation,
    DashboardSnapshot,
};
pub use rsvp::{submit_response, validate_submission, RsvpError, RsvpSubmission};
