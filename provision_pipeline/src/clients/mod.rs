//! Thin typed clients for the external services provisioning touches.

pub mod doubleclicker;
pub mod fly;
pub mod google;
pub mod resend;
pub mod supabase;
