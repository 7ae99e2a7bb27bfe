use crate::config::Settings;
use crate::error::{AuthError, SessionError};
use crate::session::SessionManager;
use jobtrack_api::UserProfile;
use secrecy::SecretString;

/// Sign in through the browser: open Google's consent page, then read back
/// the access token the redirect page shows.
pub async fn interactive_login(
    settings: &Settings,
    session: &SessionManager,
) -> Result<UserProfile, SessionError> {
    let auth_url = settings.authorization_url()?;

    println!("\n=== Job Tracker Sign-in ===\n");
    println!("This will open your browser to sign in with Google.");

    // Open browser
    if let Err(e) = open::that(auth_url.as_str()) {
        eprintln!("Failed to open browser automatically: {}", e);
        eprintln!("\nPlease open this URL in your browser:");
        eprintln!("{}\n", auth_url);
    } else {
        println!("Browser opened. You can also open this URL directly:");
        println!("{}\n", auth_url);
    }

    println!("After approving, paste the access_token from the redirect URL:");
    let mut input = String::new();
    std::io::stdin()
        .read_line(&mut input)
        .map_err(AuthError::from)?;

    let token = extract_access_token(&input).ok_or_else(|| {
        AuthError::Configuration("No access token was entered".to_string())
    })?;

    let user = session.login(SecretString::from(token)).await?;
    println!("✓ Signed in as {}\n", user.email);
    Ok(user)
}

/// Accepts either the bare token or the whole redirect URL.
fn extract_access_token(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    let fragment = input
        .split_once('#')
        .map(|(_, fragment)| fragment)
        .unwrap_or(input);
    if fragment.contains('=') {
        return url::form_urlencoded::parse(fragment.as_bytes())
            .find(|(key, _)| key == "access_token")
            .map(|(_, value)| value.into_owned())
            .filter(|token| !token.is_empty());
    }

    Some(input.to_string())
}
