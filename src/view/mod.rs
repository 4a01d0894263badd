//! Page rendering module
//!
//! Builds the HTML pages served by the handlers: a shared layout plus
//! per-page bodies. User-supplied content is escaped before insertion.

use std::fmt::Write;

/// Escape text for safe insertion into HTML
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Wrap a page body in the shared layout
///
/// The flash message, when present, renders once at the top; the footer
/// shows the signed-in user with a sign-out button, or a sign-in link.
pub fn layout(title: &str, body: &str, flash: Option<&str>, username: Option<&str>) -> String {
    let flash_html = flash.map_or_else(String::new, |message| {
        format!("<p class=\"message\">{}</p>\n", escape_html(message))
    });

    let account_html = match username {
        Some(user) => format!(
            concat!(
                "<p>Signed in as {}.</p>\n",
                "<form method=\"post\" action=\"/users/signout\" class=\"inline\">\n",
                "<button type=\"submit\">Sign Out</button>\n",
                "</form>"
            ),
            escape_html(user)
        ),
        None => String::from("<p><a href=\"/users/signin\">Sign In</a></p>"),
    };

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{title}</title>
    <style>
        body {{
            font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, Arial, sans-serif;
            line-height: 1.5;
            max-width: 720px;
            margin: 24px auto;
            padding: 0 16px;
            color: #222;
        }}
        .message {{
            background: #fff5c2;
            border: 1px solid #e5d98a;
            border-radius: 4px;
            padding: 8px 12px;
        }}
        .inline {{ display: inline; }}
        ul.listing {{ list-style: none; padding-left: 0; }}
        ul.listing li {{ margin: 6px 0; }}
        textarea {{ width: 100%; }}
        footer {{ margin-top: 32px; border-top: 1px solid #ddd; }}
    </style>
</head>
<body>
{flash_html}{body}
<footer>
{account_html}
</footer>
</body>
</html>"#
    )
}

/// Index page: document listing with per-document actions
pub fn index_page(files: &[String], flash: Option<&str>, username: Option<&str>) -> String {
    let mut body = String::from("<h2>Documents</h2>\n<ul class=\"listing\">\n");
    for name in files {
        let escaped = escape_html(name);
        let _ = write!(
            body,
            concat!(
                "<li><a href=\"/{name}\">{name}</a>\n",
                "<a href=\"/{name}/edit\">edit</a>\n",
                "<form method=\"post\" action=\"/{name}/delete\" class=\"inline\">",
                "<button type=\"submit\">Delete</button></form>\n",
                "<form method=\"post\" action=\"/{name}/duplicate\" class=\"inline\">",
                "<button type=\"submit\">Duplicate</button></form></li>\n"
            ),
            name = escaped
        );
    }
    body.push_str("</ul>\n<p><a href=\"/new\">New Document</a> | <a href=\"/images\">Images</a></p>");

    layout("Documents", &body, flash, username)
}

/// New-document form
pub fn new_document_page(flash: Option<&str>, username: Option<&str>) -> String {
    let body = concat!(
        "<h2>Add a new document</h2>\n",
        "<form method=\"post\" action=\"/new\">\n",
        "<input name=\"new_file\" autofocus>\n",
        "<select name=\"extension\">\n",
        "<option value=\".txt\">.txt</option>\n",
        "<option value=\".md\">.md</option>\n",
        "</select>\n",
        "<button type=\"submit\">Create</button>\n",
        "</form>"
    );
    layout("New Document", body, flash, username)
}

/// Edit form; markdown documents also list images to insert
pub fn edit_page(
    filename: &str,
    content: &str,
    images: Option<&[String]>,
    flash: Option<&str>,
    username: Option<&str>,
) -> String {
    let escaped_name = escape_html(filename);
    let mut body = format!(
        concat!(
            "<h2>Edit content of {name}:</h2>\n",
            "<form method=\"post\" action=\"/{name}/edit\">\n",
            "<textarea name=\"content\" rows=\"20\">{content}</textarea>\n",
            "<button type=\"submit\">Save Changes</button>\n",
            "</form>\n"
        ),
        name = escaped_name,
        content = escape_html(content)
    );

    if let Some(images) = images {
        body.push_str("<h3>Add an Image</h3>\n<ul class=\"listing\">\n");
        for image in images {
            let _ = write!(
                body,
                concat!(
                    "<li>{image}\n",
                    "<form method=\"post\" action=\"/{name}/add-image/{image}\" class=\"inline\">",
                    "<button type=\"submit\">Add</button></form></li>\n"
                ),
                name = escaped_name,
                image = escape_html(image)
            );
        }
        body.push_str("</ul>\n");
    }

    layout(&format!("Edit {filename}"), &body, flash, username)
}

/// Image gallery with the upload form
pub fn images_page(images: &[String], flash: Option<&str>, username: Option<&str>) -> String {
    let mut body = String::from("<h2>Images</h2>\n<ul class=\"listing\">\n");
    for image in images {
        let escaped = escape_html(image);
        let _ = write!(
            body,
            "<li>{escaped}<br><img src=\"/uploads/{escaped}\" alt=\"{escaped}\"></li>\n"
        );
    }
    body.push_str(concat!(
        "</ul>\n",
        "<h3>Upload an image</h3>\n",
        "<form method=\"post\" action=\"/upload\" enctype=\"multipart/form-data\">\n",
        "<input type=\"file\" name=\"file\">\n",
        "<input type=\"submit\" value=\"Upload\">\n",
        "</form>\n",
        "<p><a href=\"/\">All Documents</a></p>"
    ));

    layout("Images", &body, flash, username)
}

/// Sign-in form
pub fn signin_page(flash: Option<&str>, username: Option<&str>) -> String {
    let body = concat!(
        "<h2>Sign In</h2>\n",
        "<form method=\"post\" action=\"/users/signin\">\n",
        "<label>Username: <input name=\"username\" autofocus></label>\n",
        "<label>Password: <input type=\"password\" name=\"password\"></label>\n",
        "<button type=\"submit\">Sign In</button>\n",
        "</form>\n",
        "<p>No account yet? <a href=\"/users/signup\">Sign Up</a></p>"
    );
    layout("Sign In", body, flash, username)
}

/// Sign-up form
pub fn signup_page(flash: Option<&str>, username: Option<&str>) -> String {
    let body = concat!(
        "<h2>Sign Up</h2>\n",
        "<form method=\"post\" action=\"/users/signup\">\n",
        "<label>Username: <input name=\"username\" autofocus></label>\n",
        "<label>Password: <input type=\"password\" name=\"password\"></label>\n",
        "<label>Verify Password: <input type=\"password\" name=\"verify_password\"></label>\n",
        "<button type=\"submit\">Sign Up</button>\n",
        "</form>"
    );
    layout("Sign Up", body, flash, username)
}
