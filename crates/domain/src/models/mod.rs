//! Domain models for the wedding RSVP backend.

pub mod export;
pub mod gallery;
pub mod guest;
pub mod invitation;
pub mod listing;
pub mod lodging;
pub mod response;
pub mod stats;

pub use export::{export_filename, render_guest_csv};
pub use gallery::Album;
pub use guest::{build_guest_rows, GuestRow};
pub use invitation::{
    generate_invitation_code, CreateInvitationRequest, InvitationCode, InvitationRegistry,
};
pub use listing::{GuestFilter, SortDirection, SortKey, SortState, StatusFilter};
pub use lodging::{Accommodation, LodgingCatalog, LodgingGroup, LodgingSuggestion};
pub use response::{
    response_key, Attendance, GuestStatus, ResponseData, ResponseRecord, RsvpStatus, SubEvent,
};
pub use stats::{CodeConfirmation, DashboardStats, EventAttendance};
