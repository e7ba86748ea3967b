//! HTML bodies for the two mails this service sends. Kept in one place so
//! routes and use cases never build markup inline.

/// One-time login link.
pub fn login_link(link: &str) -> (String, String) {
    let subject = "Your abosplit login link".to_string();
    let body = format!(
        "<p>Click to sign in. The link is valid once and expires shortly.</p>\
         <p><a href=\"{}\">Sign in</a></p>",
        link
    );
    (subject, body)
}

/// Sent to a subscription's owner when someone claims an invite.
pub fn invite_claimed(subscription_name: &str, claimant_name: &str) -> (String, String) {
    let subject = format!("{} joined your {} plan", claimant_name, subscription_name);
    let body = format!(
        "<p>{} accepted your invite and now occupies a slot on <b>{}</b>.</p>\
         <p>You can review or remove shares any time.</p>",
        claimant_name, subscription_name
    );
    (subject, body)
}
