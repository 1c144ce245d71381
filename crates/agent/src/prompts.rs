use coda_common::{ChatMessage, Template};

pub const REACT_STARTER: &str = r#"import React from 'react';
import { Button } from "@/components/ui/button";
import { Input } from "@/components/ui/input";
import { Card, CardHeader, CardTitle, CardDescription, CardContent, CardFooter } from "@/components/ui/card";
import { Label } from "@/components/ui/label";

// When creating components, use shadcn/ui components by default.
// Available components: Button, Input, Card, Label, Select, Textarea, Checkbox, etc.
// Use Tailwind CSS for styling.
// Make sure to return a single root element.

export default function MyComponent() {
  return (
    <div>
      {/* Your component here */}
    </div>
  );
}"#;

pub const HTML_STARTER: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Document</title>
    <script src="https://cdn.tailwindcss.com"></script>
    <style>
        body {
            font-family: 'Inter', sans-serif;
        }
    </style>
</head>
<body class="bg-gray-100">
    </body>
</html>"#;

/// JSON key holding the produced text for each kind of request.
pub const KEY_IMPROVED: &str = "improvedCode";
pub const KEY_REDESIGNED: &str = "redesignedCode";
pub const KEY_CHAT: &str = "chatResponse";
pub const KEY_EXPLANATION: &str = "explanation";
pub const KEY_REASONING: &str = "reasoning";

/// Starter code for templates that modify code; anything but `html` starts
/// from the React component.
pub fn starter_code(template: Template) -> &'static str {
    match template {
        Template::Html => HTML_STARTER,
        _ => REACT_STARTER,
    }
}

pub fn code_key(template: Template) -> &'static str {
    match template {
        Template::PublicChat => KEY_CHAT,
        Template::Redesign | Template::UrlRedesign => KEY_REDESIGNED,
        Template::React | Template::Html => KEY_IMPROVED,
    }
}

pub fn modify_code(template: Template, base_code: &str, request: &str) -> String {
    format!(
        "You are an expert software developer specializing in REACT and HTML. \
Based on the user's request, you will modify the provided base code.

- For \"REACT\" requests, you MUST use shadcn/ui components and ensure the code is a valid React component.
- For \"HTML\" requests, you MUST generate a complete and valid HTML document with Tailwind CSS.
- The response MUST be a JSON object with two keys: \"{KEY_IMPROVED}\" (containing the final code) \
and \"{KEY_REASONING}\" (a brief explanation of your changes).

Existing Code ({template} template to modify):
{base_code}

Description of Desired Changes:
\"{request}\"
"
    )
}

pub fn redesign_page(html: &str) -> String {
    format!(
        "You are an expert web designer. Your task is to take the provided HTML content and redesign it \
into a complete, modern, and visually appealing full-page layout using Tailwind CSS.

- You MUST build a full-page structure (header, main content, footer).
- The final output must be a single HTML file.
- The response MUST be a valid JSON object with two keys: \"{KEY_REDESIGNED}\" and \"{KEY_REASONING}\".
- The value for \"{KEY_REDESIGNED}\" MUST be a single JSON string containing the full HTML. \
Ensure all special characters and newlines within the HTML are properly escaped to create a valid JSON string.

Existing HTML Content to use for the main body:
```html
{html}
```

Description of Desired Redesign: \"Redesign this content into a complete, modern webpage with a full top-to-bottom layout.\"
"
    )
}

pub fn redesign_html(html: &str, description: Option<&str>) -> String {
    let description =
        description.unwrap_or("Redesign this HTML code into a modern layout with Tailwind CSS.");
    format!(
        "You are an expert web designer. Your task is to redesign the given HTML code into a modern, \
visually appealing layout using Tailwind CSS and subtle JavaScript animations.

- The final output must be a single HTML file with Tailwind CSS classes and inline JavaScript.
- Do not use external CSS or JavaScript files.
- Use placeholder images from https://placehold.co if needed.
- The response MUST be a valid JSON object with two keys: \"{KEY_REDESIGNED}\" and \"{KEY_REASONING}\". \
The value for \"{KEY_REDESIGNED}\" MUST be a single JSON string with the HTML content properly escaped.

Existing HTML:
```html
{html}
```
Description of Desired Redesign: \"{description}\"
"
    )
}

/// `role: content` turns separated by blank lines.
pub fn render_history(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .map(|m| format!("{}: {}", m.role.as_str(), m.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn public_chat(messages: &[ChatMessage]) -> String {
    format!(
        "You are **CoDa** the \"CodeAssist AI Companion\", a friendly and knowledgeable AI assistant \
specializing in software development, technology, and AI news.

Your goal is to engage users in discussions and provide expert assistance. Your functions include:

1.  **General Conversation**: Discuss coding projects, challenges, and the latest in technology and AI.
2.  **Code Debugging**: If a user provides a code snippet, you MUST act as an expert debugger.
    -   Analyze the code for errors (syntax, logic, etc.).
    -   Clearly explain the error and its cause.
    -   Provide the corrected code snippet.
    -   If the code is functional, suggest improvements for performance or readability.

Your Rules:
-   Maintain a positive, supportive, and enthusiastic tone.
-   Use Unicode emojis to be more expressive (e.g., ✅, 💡, 🐛).
-   Provide informative and in-depth answers.
-   Your responses MUST be in JSON format with a single key: \"{KEY_CHAT}\".

User Message History:
{history}

assist:",
        history = render_history(messages)
    )
}

pub fn improve(code: &str, description: &str) -> String {
    format!(
        "You are an expert software developer. You will be given existing code and a description of desired changes.

Your task is to improve and modify the code based on the description. \
Return a JSON object with the improved and modified code under \"{KEY_IMPROVED}\" \
and a brief reasoning of the changes you made under \"{KEY_REASONING}\".

Existing Code:
{code}

Description of Desired Changes:
{description}"
    )
}

pub fn explain(code: &str) -> String {
    format!(
        "You are an expert software developer. Explain the following code in natural language. \
Return a JSON object with a single key \"{KEY_EXPLANATION}\".

{code}"
    )
}

/// Asks for edit blocks against `document` instead of a whole new file.
pub fn edit_blocks(document: &str, request: &str) -> String {
    format!(
        "You are an expert software developer. Change the code below as requested.

{format}
Current code:
{document}

Requested change:
{request}",
        format = coda_patcher::edit_format_instructions()
    )
}
