//! Account commands: login, signup, logout, profile and address.

use aba_market_client::types::Address;
use aba_market_client::{Credentials, NewAccount, StoreClient};
use aba_market_core::Email;

/// Log in, merging any guest cart into the account's cart.
#[allow(clippy::print_stdout)]
pub async fn login(
    client: &StoreClient,
    username: &str,
    password: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let username = Email::parse(username)?;
    let credentials = Credentials {
        username: username.to_string(),
        password: password.to_string(),
    };
    let profile = client.auth().login(&credentials).await?;

    println!("Signed in as {} <{}>.", profile.display_name(), profile.email);

    let count = client.cart().item_count();
    if count > 0 {
        println!(
            "Your cart has {count} item(s) worth {}.",
            client.cart().total().display()
        );
    }
    Ok(())
}

/// Create an account, optionally logging in right after.
#[allow(clippy::print_stdout)]
pub async fn signup(
    client: &StoreClient,
    first_name: &str,
    last_name: &str,
    email: &str,
    password: &str,
    login_after: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let email = Email::parse(email)?;
    let account = NewAccount {
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        email: email.to_string(),
        password: password.to_string(),
    };
    client.auth().signup(&account).await?;
    println!("Account created for {email}.");

    if login_after {
        login(client, email.as_str(), password).await?;
    }
    Ok(())
}

/// Log out of the current session.
#[allow(clippy::print_stdout)]
pub async fn logout(client: &StoreClient) {
    client.auth().logout().await;
    println!("Signed out.");
}

/// Show the signed-in user.
#[allow(clippy::print_stdout)]
pub fn whoami(client: &StoreClient) -> Result<(), Box<dyn std::error::Error>> {
    match client.auth().profile() {
        Some(profile) => {
            println!("{} <{}>", profile.display_name(), profile.email);
            if let Some(address) = &profile.default_address {
                println!(
                    "Default address: {}, {}, {}, {}",
                    address.street_address, address.city, address.state, address.country
                );
            }
            Ok(())
        }
        None => Err("Not signed in.".into()),
    }
}

/// Replace the default address.
#[allow(clippy::print_stdout)]
pub async fn set_address(
    client: &StoreClient,
    street: String,
    city: String,
    state: String,
    postal_code: Option<String>,
    country: String,
) -> Result<(), Box<dyn std::error::Error>> {
    if client.auth().profile().is_none() {
        return Err("Sign in to update your address: aba-cli account login".into());
    }

    let address = Address {
        street_address: street,
        city,
        state,
        postal_code,
        country,
    };
    let profile = client.account().update_address(address).await?;

    match &profile.default_address {
        Some(saved) => println!(
            "Default address set: {}, {}, {}, {}",
            saved.street_address, saved.city, saved.state, saved.country
        ),
        None => println!("Address updated."),
    }
    Ok(())
}
