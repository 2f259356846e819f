//! WhatsApp share links for invites and tickets.

const WHATSAPP_SEND: &str = "https://wa.me/?text=";

/// Link that opens WhatsApp with `message` ready to send.
pub fn whatsapp_share_url(message: &str) -> String {
    format!("{}{}", WHATSAPP_SEND, encode_uri_component(message))
}

/// Message sent along with an invite link. Falls back to the invite label when no guest names
/// are listed.
pub fn invite_message(names: &[String], label: &str, link: &str) -> String {
    let greeting = if names.is_empty() {
        label.to_string()
    } else {
        names.join(", ")
    };
    format!(
        "Hello {}! 🥂✨\n\nWe've prepared a special invitation for our wedding. \
         To see it and confirm your attendance, open the link below:\n\n{}\n\n\
         We'd be so happy to have you with us! 🤍",
        greeting, link
    )
}

pub fn ticket_message(ticket_url: &str) -> String {
    format!(
        "Hello! Here is my confirmation ticket for your wedding! 💍✨\n\n\
         Ticket: {}\n\nI can't wait for the big day! ❤️",
        ticket_url
    )
}

// Same escaping as JavaScript's encodeURIComponent: unreserved characters stay, every other
// UTF-8 byte becomes %XX.
fn encode_uri_component(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => out.push(byte as char),
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_uri_component() {
        assert_eq!(encode_uri_component("Olá João!"), "Ol%C3%A1%20Jo%C3%A3o!");
        assert_eq!(
            encode_uri_component("http://x/rsvp?token=AB12&a=b"),
            "http%3A%2F%2Fx%2Frsvp%3Ftoken%3DAB12%26a%3Db"
        );
        assert_eq!(encode_uri_component("line\nbreak +1"), "line%0Abreak%20%2B1");
        assert_eq!(encode_uri_component("it's (fine) *~._-"), "it's%20(fine)%20*~._-");
        assert_eq!(encode_uri_component("🤍"), "%F0%9F%A4%8D");
    }

    #[test]
    fn test_whatsapp_share_url() {
        assert_eq!(
            whatsapp_share_url("Hi there"),
            "https://wa.me/?text=Hi%20there"
        );
        assert_eq!(whatsapp_share_url(""), "https://wa.me/?text=");
    }

    #[test]
    fn test_invite_message_uses_names_or_label() {
        let link = "http://127.0.0.1:3000/rsvp?token=ABCD1234";
        let names = vec!["Rita Costa".to_string(), "Paulo Costa".to_string()];
        let message = invite_message(&names, "Família Costa", link);
        assert!(message.starts_with("Hello Rita Costa, Paulo Costa!"));
        assert!(message.contains(link));

        let message = invite_message(&[], "Família Costa", link);
        assert!(message.starts_with("Hello Família Costa!"));

        let url = whatsapp_share_url(&invite_message(&names, "Família Costa", link));
        assert!(url.contains("token%3DABCD1234"));
        assert!(!url.contains(' '));
        assert!(!url.contains('\n'));
    }

    #[test]
    fn test_ticket_message() {
        let url = "http://127.0.0.1:3000/tickets/ticket-7-1779301800.svg";
        let message = ticket_message(url);
        assert!(message.contains(&format!("Ticket: {}", url)));
        assert!(whatsapp_share_url(&message).contains("ticket-7-1779301800.svg"));
    }
}
