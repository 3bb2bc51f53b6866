use clap::Parser;
use rand::Rng;
use shared::transport::{read_frame, write_frame};
use shared::{Action, Command, Envelope, PositionUpdate, Request, Response};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::sleep;

/// Scripted headless client: registers, walks a few cells and replays one
/// command to show that the server drops retransmissions.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Server address
    #[arg(short, long, default_value = shared::DEFAULT_SERVER_ADDR)]
    server: String,

    /// Number of steps to walk
    #[arg(long, default_value = "4")]
    steps: u32,
}

async fn call(
    stream: &mut TcpStream,
    request: Request,
) -> Result<Response, Box<dyn std::error::Error>> {
    write_frame(stream, &Envelope::new(request)).await?;
    Ok(read_frame(stream).await?)
}

fn describe(label: &str, response: &Response, client_id: &str) {
    let me = response.snapshot.players.get(client_id);
    println!(
        "{:<10} -> {:<18} {:?} | me: {:?} | players: {} | status: {:?}",
        label,
        response.outcome,
        response.message,
        me.map(|p| (p.x, p.y, p.lives, p.last_applied_sequence)),
        response.snapshot.players.len(),
        response.snapshot.status
    );
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let client_id = format!("Jogador-{}", rand::thread_rng().gen_range(0..10_000));

    println!("Connecting to {} as {}", args.server, client_id);
    let mut stream = TcpStream::connect(&args.server).await?;

    let mut sequence = 1;
    let register = Command::new(client_id.as_str(), sequence, Action::Register);
    let response = call(&mut stream, Request::ExecuteCommand(register.clone())).await?;
    describe("register", &response, &client_id);

    let Some(mut me) = response.snapshot.players.get(&client_id).copied() else {
        println!("Server did not register us, giving up");
        return Ok(());
    };

    let mut last = register;
    for _ in 0..args.steps {
        sequence += 1;
        let target = me.position().offset(1, 0);
        let command = Command::new(
            client_id.as_str(),
            sequence,
            Action::Legacy {
                action: "update_position".into(),
                detail: PositionUpdate::new(target, None).to_detail(),
            },
        );
        let response = call(&mut stream, Request::ExecuteCommand(command.clone())).await?;
        describe("move", &response, &client_id);
        if let Some(p) = response.snapshot.players.get(&client_id) {
            me = *p;
        }
        last = command;
        sleep(Duration::from_millis(200)).await;
    }

    println!("Replaying sequence {}", last.sequence);
    let response = call(&mut stream, Request::ExecuteCommand(last)).await?;
    describe("replay", &response, &client_id);

    sequence += 1;
    let garbage = Command::new(
        client_id.as_str(),
        sequence,
        Action::Legacy {
            action: "update_position".into(),
            detail: "garbage".into(),
        },
    );
    let response = call(&mut stream, Request::ExecuteCommand(garbage)).await?;
    describe("garbage", &response, &client_id);

    let response = call(
        &mut stream,
        Request::FetchState {
            client_id: client_id.clone(),
        },
    )
    .await?;
    describe("fetch", &response, &client_id);
    for row in response.snapshot.grid.rows() {
        println!("{}", row);
    }

    Ok(())
}
