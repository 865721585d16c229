//! Folds decoded dispatch events into the session model.

use tracing::{debug, info};

use crate::domain::entities::{ClientUser, Message, Participant};
use crate::domain::events::{DispatchEvent, MessageEvent, ReadyEvent};

/// Applies `event` to the model. Returns the message to render when the
/// event carries one for the focused channel.
pub fn apply_event(client: &mut Option<ClientUser>, event: DispatchEvent) -> Option<Message> {
    match event {
        DispatchEvent::Ready(ready) => {
            let model = build_client(ready);
            info!(
                user = %model.me().username(),
                guilds = model.guilds().len(),
                private_channels = model.private_channels().len(),
                "Session ready"
            );
            *client = Some(model);
            None
        }
        DispatchEvent::MessageCreate(event) => {
            let Some(model) = client.as_mut() else {
                debug!("Message before READY, ignoring");
                return None;
            };
            apply_message(model, event)
        }
        DispatchEvent::Unknown { event_type } => {
            debug!(event = %event_type, "Ignoring dispatch");
            None
        }
    }
}

fn build_client(ready: ReadyEvent) -> ClientUser {
    let mut client = ClientUser::new(ready.user);

    for user in ready.users {
        client.remember_user(user);
    }

    for entry in ready.private_channels {
        let recipients = entry
            .recipient_ids
            .iter()
            .filter_map(|id| client.user(*id).cloned())
            .collect();
        client.add_private_channel(entry.channel.with_recipients(recipients));
    }

    for guild in ready.guilds {
        client.add_guild(guild);
    }

    client
}

fn apply_message(client: &mut ClientUser, event: MessageEvent) -> Option<Message> {
    let MessageEvent {
        mut message,
        member_role_ids,
    } = event;

    client.remember_user(message.author().user().clone());
    for mentioned in message.mentions() {
        client.remember_user(mentioned.user().clone());
    }

    let overlay = match message.author() {
        Participant::Member(member) => Some(member.clone()),
        Participant::User(_) => None,
    };

    if let (Some(member), Some(guild)) = (
        overlay,
        message.guild_id().and_then(|id| client.guild_mut(id)),
    ) {
        let member = member.with_roles(guild.roles_matching(&member_role_ids));
        guild.remember_member(member.clone());
        message = message.with_author(Participant::Member(member));
    }

    if client.is_focused(message.channel_id()) {
        Some(message)
    } else {
        debug!(channel = %message.channel_id(), "Message outside focus");
        None
    }
}
