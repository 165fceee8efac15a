//! Namespace derivation for outbound commands.
//!
//! Base commands live directly under the protocol namespace
//! (`urn:xmpp:ozone:1`); every other family gets its own segment
//! (`urn:xmpp:ozone:say:1`).

pub const BASE_NAMESPACE: &str = "urn:xmpp:ozone";
pub const PROTOCOL_VERSION: &str = "1";

/// Commands whose namespace has no family segment.
pub const BASE_COMMANDS: [&str; 5] = ["accept", "answer", "hangup", "reject", "redirect"];

pub fn is_base_command(name: &str) -> bool {
    BASE_COMMANDS
        .iter()
        .any(|base| base.eq_ignore_ascii_case(name))
}

/// Derives the namespace for a command family name.
pub fn namespace_for(family: &str) -> String {
    let name = family.to_ascii_lowercase();
    if is_base_command(&name) {
        format!("{BASE_NAMESPACE}:{PROTOCOL_VERSION}")
    } else {
        format!("{BASE_NAMESPACE}:{name}:{PROTOCOL_VERSION}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_commands_have_no_family_segment() {
        for name in BASE_COMMANDS {
            assert_eq!(namespace_for(name), "urn:xmpp:ozone:1");
        }
        assert_eq!(namespace_for("Redirect"), "urn:xmpp:ozone:1");
    }

    #[test]
    fn family_commands_carry_lowercase_segment() {
        assert_eq!(namespace_for("Say"), "urn:xmpp:ozone:say:1");
        assert_eq!(namespace_for("conference"), "urn:xmpp:ozone:conference:1");
        assert_eq!(namespace_for("TRANSFER"), "urn:xmpp:ozone:transfer:1");
    }
}
