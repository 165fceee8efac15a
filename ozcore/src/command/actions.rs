//! Sub-actions issued against a running say or conference.

use crate::error::CommandError;
use crate::message::{CommandKind, Correlation, Message};
use ozcore_xml::node::{Attrs, NodeContent};

impl Message {
    pub fn pause(&self) -> Result<Message, CommandError> {
        self.sub_action(CommandKind::Pause, None)
    }

    pub fn resume(&self) -> Result<Message, CommandError> {
        self.sub_action(CommandKind::Resume, None)
    }

    pub fn stop(&self) -> Result<Message, CommandError> {
        self.sub_action(CommandKind::Stop, None)
    }

    pub fn mute(&self) -> Result<Message, CommandError> {
        self.sub_action(CommandKind::Mute, None)
    }

    pub fn unmute(&self) -> Result<Message, CommandError> {
        self.sub_action(CommandKind::Unmute, None)
    }

    /// Removes the participant from the conference, with an optional reason.
    pub fn kick(&self, reason: Option<&str>) -> Result<Message, CommandError> {
        let content = reason.map(|r| NodeContent::String(r.to_string()));
        self.sub_action(CommandKind::Kick, content)
    }

    /// The sub-action targets the same call; its own command id is assigned
    /// when issued. The spawning message's correlation is kept as `parent`,
    /// so that message must already carry its command id.
    fn sub_action(
        &self,
        action: CommandKind,
        content: Option<NodeContent>,
    ) -> Result<Message, CommandError> {
        if self.kind() != action.family() {
            return Err(CommandError::InvalidSubAction {
                action: action.tag(),
                family: self.kind().family().tag(),
            });
        }
        if self.command_id().is_none() {
            return Err(CommandError::UnaddressedSubAction {
                action: action.tag(),
                family: self.kind().tag(),
            });
        }

        let correlation = Correlation {
            call_id: self.correlation().call_id.clone(),
            command_id: None,
        };
        Ok(Message::from_parts(action, Attrs::new(), content, correlation)
            .with_parent(self.correlation().clone()))
    }
}

#[cfg(test)]
mod tests {
    use crate::command::{Command, ConferenceOptions, HeaderOptions, SayOptions};
    use crate::error::CommandError;
    use crate::message::{CommandKind, Correlation};

    #[test]
    fn say_sub_actions_stay_in_say_family() {
        let say = Command::Say(SayOptions::text("hello"))
            .build(Correlation::new("c1", "say-1"))
            .unwrap();

        for (action, tag) in [
            (say.pause().unwrap(), "pause"),
            (say.resume().unwrap(), "resume"),
            (say.stop().unwrap(), "stop"),
        ] {
            assert_eq!(action.tag(), tag);
            assert_eq!(action.namespace(), "urn:xmpp:ozone:say:1");
            assert_eq!(action.call_id(), Some("c1"));
            assert_eq!(action.command_id(), None);
            assert_eq!(action.parent(), Some(&Correlation::new("c1", "say-1")));
            assert_eq!(
                action.to_xml().unwrap(),
                format!(r#"<{tag} xmlns="urn:xmpp:ozone:say:1"/>"#)
            );
        }
    }

    #[test]
    fn conference_sub_actions() {
        let conf = Command::Conference(ConferenceOptions::new("room"))
            .build(Correlation::new("c2", "conf-1"))
            .unwrap();

        assert_eq!(conf.mute().unwrap().kind(), CommandKind::Mute);
        assert_eq!(
            conf.unmute().unwrap().namespace(),
            "urn:xmpp:ozone:conference:1"
        );
        let kick = conf.kick(Some("bye")).unwrap();
        assert_eq!(
            kick.to_xml().unwrap(),
            r#"<kick xmlns="urn:xmpp:ozone:conference:1">bye</kick>"#
        );
        assert_eq!(kick.target().as_deref(), Some("c2/conf-1"));
    }

    #[test]
    fn sub_action_on_wrong_family_fails() {
        let answer = Command::Answer(HeaderOptions::default())
            .build(Correlation::call("c1"))
            .unwrap();
        assert!(matches!(
            answer.pause(),
            Err(CommandError::InvalidSubAction { action: "pause", family: "answer" })
        ));

        let say = Command::Say(SayOptions::text("hi"))
            .build(Correlation::call("c1"))
            .unwrap();
        assert!(say.mute().is_err());
    }

    #[test]
    fn sub_action_needs_parent_command_id() {
        let say = Command::Say(SayOptions::text("hi"))
            .build(Correlation::call("c1"))
            .unwrap();
        assert!(matches!(
            say.pause(),
            Err(CommandError::UnaddressedSubAction { action: "pause", family: "say" })
        ));

        let conf = Command::Conference(ConferenceOptions::new("room"))
            .build(Correlation::call("c1"))
            .unwrap();
        assert!(matches!(
            conf.kick(None),
            Err(CommandError::UnaddressedSubAction { action: "kick", family: "conference" })
        ));

        let say = say.with_command_id("say-1");
        assert_eq!(say.pause().unwrap().target().as_deref(), Some("c1/say-1"));
    }
}
