//! Prompt text sent to the generative service.

use std::fmt::Write;

use complaint_pdf_rust::Language;

pub struct ComplaintPrompt<'a> {
    pub label: &'a str,
    pub latitude: &'a str,
    pub longitude: &'a str,
    pub user_name: &'a str,
    pub user_details: Option<&'a str>,
    pub place_name: Option<&'a str>,
}

/// Formal letter to the municipal authority. Asks for the section labels the
/// PDF renderer recognises so the letter lays out with headings.
pub fn complaint_prompt(req: &ComplaintPrompt<'_>) -> String {
    let place = req
        .place_name
        .map(|name| format!("- The place name ({})\n", name))
        .unwrap_or_default();
    format!(
        "You are a concerned citizen writing a formal complaint letter to the local municipal \
authority regarding an infrastructure issue. Please generate a well-structured, polite, and \
professional letter suitable for submission to a government office. The letter should include:

- A formal salutation (e.g., To The Municipal Commissioner)
- The sender's name and contact details
- A clear subject line mentioning the detected issue
- A detailed description of the issue (Detected issue: {label})
- The exact location (GPS Coordinates: {lat}, {lon})
{place}- The impact on the public and urgency
- A specific, actionable request for resolution
- Guidance on where and how to submit this complaint (e.g., \"This letter can be submitted to \
the local municipal office, online grievance portal, or via email as per the city's complaint \
process.\")
- A formal closing and signature

Start each part on its own line with one of these labels: Salutation:, Subject:, Description:, \
Location:, Impact/Urgency:, Requested Action:, Closing:, Signature:.

Sender's Name: {name}
Sender's Contact: {contact}

Limit: 180 words. Use clear, formal, and respectful language. Format the letter for official \
government correspondence.",
        label = req.label,
        lat = req.latitude,
        lon = req.longitude,
        place = place,
        name = req.user_name,
        contact = req.user_details.unwrap_or("[Not provided]"),
    )
}

/// Translate a finished letter, keeping the English labels intact.
pub fn translation_prompt(letter: &str, language: Language) -> String {
    format!(
        "Translate the following formal complaint letter into {lang}. Keep the section labels \
(Subject:, Description:, Location:, Impact/Urgency:, Requested Action:, Salutation:, Closing:, \
Signature:) in English exactly as written and translate only the text after them. Return only \
the translated letter.\n\n{letter}",
        lang = language.display_name(),
        letter = letter.trim(),
    )
}

pub struct ChatMessage<'a> {
    pub from_user: bool,
    pub content: &'a str,
}

#[derive(Default)]
pub struct ChatContext<'a> {
    pub user_name: Option<&'a str>,
    pub place_name: Option<&'a str>,
    pub prediction: Option<&'a str>,
    pub location: Option<&'a str>,
    pub complaint: Option<&'a str>,
    pub language: Option<Language>,
}

pub fn chat_prompt(context: &ChatContext<'_>, messages: &[ChatMessage<'_>]) -> String {
    let mut prompt = String::from(
        "You are a friendly and helpful assistant. Answer the user's last question in a \
user-friendly, informative, and supportive way. If helpful, provide links to relevant places, \
resources, or government portals. Use the image, prediction, and location if they are relevant \
to the user's question. Do NOT generate a complaint letter unless the user specifically asks \
for one.\n",
    );
    // writing to a String cannot fail
    if let Some(name) = context.user_name {
        let _ = writeln!(prompt, "The user's name is {}.", name);
    }
    if let Some(place) = context.place_name {
        let _ = writeln!(prompt, "The detected place name is {}.", place);
    }
    if let Some(prediction) = context.prediction {
        let _ = writeln!(prompt, "The detected issue is {}.", prediction);
    }
    if let Some(location) = context.location {
        let _ = writeln!(prompt, "The reported location is {}.", location);
    }
    if let Some(complaint) = context.complaint {
        let _ = writeln!(prompt, "The complaint drafted so far:\n{}", complaint.trim());
    }
    if let Some(language) = context.language.filter(|l| *l != Language::English) {
        let _ = writeln!(prompt, "Reply in {}.", language.display_name());
    }
    for message in messages {
        let speaker = if message.from_user { "User" } else { "AI" };
        let _ = writeln!(prompt, "{}: {}", speaker, message.content);
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complaint_prompt_carries_request_fields() {
        let prompt = complaint_prompt(&ComplaintPrompt {
            label: "pothole",
            latitude: "17.38",
            longitude: "78.48",
            user_name: "Ravi",
            user_details: None,
            place_name: Some("Hyderabad"),
        });
        assert!(prompt.contains("Detected issue: pothole"));
        assert!(prompt.contains("GPS Coordinates: 17.38, 78.48"));
        assert!(prompt.contains("Sender's Name: Ravi"));
        assert!(prompt.contains("[Not provided]"));
        assert!(prompt.contains("Hyderabad"));
        assert!(prompt.contains("Limit: 180 words"));
    }

    #[test]
    fn test_translation_prompt_names_language() {
        let prompt = translation_prompt("Subject: Pothole\n", Language::Tamil);
        assert!(prompt.contains("into Tamil"));
        assert!(prompt.ends_with("Subject: Pothole"));
    }

    #[test]
    fn test_chat_prompt_transcript() {
        let context = ChatContext {
            user_name: Some("Asha"),
            language: Some(Language::Hindi),
            ..Default::default()
        };
        let messages = [
            ChatMessage { from_user: true, content: "Who fixes streetlights?" },
            ChatMessage { from_user: false, content: "The electricity board." },
        ];
        let prompt = chat_prompt(&context, &messages);
        assert!(prompt.starts_with("You are a friendly and helpful assistant."));
        assert!(prompt.contains("The user's name is Asha.\n"));
        assert!(prompt.contains("Reply in Hindi."));
        assert!(prompt.ends_with("User: Who fixes streetlights?\nAI: The electricity board.\n"));
        assert!(!prompt.contains("place name"));
    }
}
