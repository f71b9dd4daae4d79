/// Router Module Index
///
/// Routes are split by access level so the auth gate is applied once, as a
/// layer, to everything in `authenticated`.

/// Routes reachable without a session (accounts, health).
pub mod public;

/// Note routes. Every request must carry a logged-in session.
pub mod authenticated;
