use anyhow::{anyhow, Context, Result};
use colored::*;
use reqwest::Client;
use serde_json::{json, Value};
use std::io::{self, Write};

/// Consola interactiva contra un servidor de seguimiento en marcha
#[tokio::main]
async fn main() -> Result<()> {
    println!("{}", "🚚 Fleet Tracking Console".bright_blue().bold());
    println!("{}", "=========================".bright_blue());
    println!();

    let base_url = std::env::var("FLEET_API_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());
    let client = Client::new();

    let username = prompt("Username (admin/manager/driver): ")?;
    let password = prompt("Password: ")?;
    let token = login(&client, &base_url, &username, &password).await?;

    loop {
        println!();
        println!("{}", "📋 MENÚ PRINCIPAL".bright_green().bold());
        println!("{}", "==================".bright_green());
        println!("1. 🚗 Listar vehículos");
        println!("2. 📍 Listar geocercas");
        println!("3. 🚧 Últimas violaciones");
        println!("4. 🔄 Forzar tick de refresco");
        println!("5. 🛰️ Forzar evaluación de geocercas");
        println!("6. ⏱️ Estado de los bucles");
        println!("7. 🚪 Salir");

        let choice = prompt("Selecciona una opción (1-7): ")?;
        let path = match choice.as_str() {
            "1" => ("GET", "/api/vehicles"),
            "2" => ("GET", "/api/geofences"),
            "3" => ("GET", "/api/geofences/violations?limit=10"),
            "4" => ("POST", "/api/tracking/refresh/tick"),
            "5" => ("POST", "/api/tracking/geofence/tick"),
            "6" => ("GET", "/api/tracking/status"),
            "7" => {
                println!("{}", "👋 ¡Hasta luego!".bright_green());
                break;
            }
            _ => {
                println!("{}", "❌ Opción inválida. Intenta de nuevo.".bright_red());
                continue;
            }
        };

        match call(&client, &base_url, &token, path.0, path.1).await {
            Ok(body) => println!("{}", serde_json::to_string_pretty(&body)?),
            Err(e) => println!("{} {}", "❌".bright_red(), e.to_string().bright_red()),
        }
    }

    Ok(())
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label.bright_yellow());
    io::stdout().flush()?;
    let mut value = String::new();
    io::stdin().read_line(&mut value)?;
    Ok(value.trim().to_string())
}

async fn login(client: &Client, base_url: &str, username: &str, password: &str) -> Result<String> {
    println!();
    println!("{}", "🔐 AUTENTICANDO...".bright_cyan().bold());

    let response = client
        .post(format!("{}/api/auth/login", base_url))
        .json(&json!({ "username": username, "password": password }))
        .send()
        .await
        .context("El servidor no responde")?;

    let status = response.status();
    let body: Value = response.json().await?;
    if !status.is_success() {
        return Err(anyhow!("Login rechazado ({}): {}", status, body["message"]));
    }

    let token = body["data"]["token"]
        .as_str()
        .ok_or_else(|| anyhow!("Respuesta de login sin token"))?
        .to_string();
    println!("{} {}", "✅ Sesión iniciada como".bright_green(), body["data"]["user"]["role"]);
    Ok(token)
}

async fn call(client: &Client, base_url: &str, token: &str, method: &str, path: &str) -> Result<Value> {
    let url = format!("{}{}", base_url, path);
    let request = match method {
        "POST" => client.post(url),
        _ => client.get(url),
    };

    let response = request.bearer_auth(token).send().await?;
    let status = response.status();
    let body: Value = response.json().await.unwrap_or(Value::Null);
    if !status.is_success() {
        return Err(anyhow!("{}: {}", status, body["message"]));
    }
    Ok(body)
}
