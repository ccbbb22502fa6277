//! Deterministic worker identity generation using curated name lists.
//!
//! Produces display names, work emails and project-style task titles.
//! Same RNG seed = same identities.

use crate::rng::StreamRng;

/// Email domain for generated workers.
pub const EMAIL_DOMAIN: &str = "example.org";

pub struct NameGenerator;

impl NameGenerator {
    /// Generate a full name (first + last) deterministically.
    pub fn generate_full_name(rng: &mut StreamRng) -> String {
        let first = Self::generate_first_name(rng);
        let last = Self::generate_last_name(rng);
        format!("{} {}", first, last)
    }

    pub fn generate_first_name(rng: &mut StreamRng) -> &'static str {
        rng.pick(Self::first_names()).copied().unwrap_or("Alex")
    }

    pub fn generate_last_name(rng: &mut StreamRng) -> &'static str {
        rng.pick(Self::last_names()).copied().unwrap_or("Smith")
    }

    /// "Dana Okafor" + 7 -> "dana.okafor7@example.org".
    /// The suffix keeps emails unique when names collide.
    pub fn email_for(full_name: &str, suffix: usize) -> String {
        let local: String = full_name
            .split_whitespace()
            .map(|part| part.to_lowercase())
            .collect::<Vec<_>>()
            .join(".");
        format!("{}{}@{}", local, suffix, EMAIL_DOMAIN)
    }

    /// "Build checkout api", "Refactor billing pipeline", ...
    pub fn generate_task_title(rng: &mut StreamRng, subject: &str) -> String {
        let verb = rng.pick(Self::task_verbs()).copied().unwrap_or("Build");
        let area = rng.pick(Self::product_areas()).copied().unwrap_or("core");
        format!("{} {} {}", verb, area, subject)
    }

    fn first_names() -> &'static [&'static str] {
        &[
            "James", "Maria", "Wei", "Aisha", "Daniel", "Priya", "Lucas", "Fatima",
            "Noah", "Yuki", "Omar", "Elena", "Kofi", "Sofia", "Mateo", "Hannah",
            "Ravi", "Chloe", "Diego", "Amara", "Ethan", "Leila", "Jonas", "Mei",
            "Samuel", "Ingrid", "Tariq", "Grace", "Hugo", "Nadia", "Felix", "Zara",
            "Andre", "Olga", "Kenji", "Lucia", "Marcus", "Anika", "Pablo", "Dana",
        ]
    }

    fn last_names() -> &'static [&'static str] {
        &[
            "Smith", "Garcia", "Chen", "Okafor", "Patel", "Nguyen", "Kowalski", "Silva",
            "Johansson", "Haddad", "Tanaka", "Moreau", "Mensah", "Rossi", "Novak", "Kim",
            "Fernandez", "Schmidt", "Ibrahim", "Murphy", "Costa", "Larsen", "Reyes", "Das",
            "Popescu", "Walker", "Yilmaz", "Brennan", "Sato", "Mwangi", "Lindqvist", "Khan",
        ]
    }

    fn task_verbs() -> &'static [&'static str] {
        &[
            "Build", "Refactor", "Design", "Migrate", "Harden", "Document", "Test",
            "Automate", "Profile", "Prototype",
        ]
    }

    fn product_areas() -> &'static [&'static str] {
        &[
            "checkout", "billing", "onboarding", "search", "reporting", "auth",
            "notifications", "inventory", "analytics", "admin",
        ]
    }
}
