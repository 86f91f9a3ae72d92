use std::{sync::Arc, time::Duration};

use bytes::Bytes;
use tokio::time::timeout;

use uzel::{filter_fn, FilterChain, Hub, NonBlocking, QueueConnector, SharedConnector};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "uzel=debug".into()),
        )
        .init();

    println!("=== Uzel Chat Room Example ===\n");

    let hub = Hub::<Bytes>::new();

    let alice = QueueConnector::bounded(16);
    let bob = QueueConnector::bounded(16);
    let moderator = QueueConnector::bounded(16);

    // Модератору не показываем сообщения со словом "spam".
    let no_spam = filter_fn(|msg: Bytes| {
        if msg.windows(4).any(|w| w == b"spam") {
            None
        } else {
            Some(msg)
        }
    });

    // Табло с единственным слотом: что не влезло, то пропало.
    let board_queue = QueueConnector::bounded(1);
    let board_shared: SharedConnector<Bytes> = board_queue.clone();
    let board = NonBlocking::wrap(board_shared);

    hub.attach(alice.clone(), FilterChain::none()).await?;
    hub.attach(bob.clone(), FilterChain::none()).await?;
    hub.attach(moderator.clone(), vec![no_spam]).await?;
    hub.attach(board.clone(), FilterChain::none()).await?;

    example_1_broadcast(&alice, &bob, &moderator).await;
    example_2_filtering(&alice, &bob, &moderator).await;
    example_3_lossy_board(&alice, &board_queue).await;
    example_4_detach(&hub, bob.clone(), &alice, &moderator).await;

    hub.destroy().await;
    println!("\n=== Hub destroyed, all workers are gone ===");
    Ok(())
}

/// Пример 1: обычная раздача — все, кроме отправителя, получают сообщение.
async fn example_1_broadcast(
    alice: &QueueConnector<Bytes>,
    bob: &QueueConnector<Bytes>,
    moderator: &QueueConnector<Bytes>,
) {
    println!("Example 1: Broadcast");
    println!("--------------------");

    alice.send(Bytes::from_static(b"hello everyone")).await;

    let at_bob = bob.recv().await.unwrap();
    let at_moderator = moderator.recv().await.unwrap();
    println!("bob saw:       {}", String::from_utf8_lossy(&at_bob));
    println!("moderator saw: {}\n", String::from_utf8_lossy(&at_moderator));
}

/// Пример 2: фильтр получателя — спам исчезает только для модератора.
async fn example_2_filtering(
    alice: &QueueConnector<Bytes>,
    bob: &QueueConnector<Bytes>,
    moderator: &QueueConnector<Bytes>,
) {
    println!("Example 2: Per-recipient filtering");
    println!("----------------------------------");

    alice.send(Bytes::from_static(b"buy spam today")).await;
    alice.send(Bytes::from_static(b"lunch at noon?")).await;

    // Боб видит оба сообщения.
    let first = bob.recv().await.unwrap();
    let second = bob.recv().await.unwrap();
    println!("bob saw:       {}", String::from_utf8_lossy(&first));
    println!("bob saw:       {}", String::from_utf8_lossy(&second));

    // Модератор — только чистое.
    let clean = moderator.recv().await.unwrap();
    println!("moderator saw: {} (spam filtered out)\n", String::from_utf8_lossy(&clean));
}

/// Пример 3: табло с политикой DropIfUnready — переполненный слот
/// не тормозит чат.
async fn example_3_lossy_board(alice: &QueueConnector<Bytes>, board: &Arc<QueueConnector<Bytes>>) {
    println!("Example 3: Lossy board (DropIfUnready)");
    println!("--------------------------------------");

    // В слоте могло застрять сообщение из прошлых примеров.
    while timeout(Duration::from_millis(100), board.recv()).await.is_ok() {}

    alice.send(Bytes::from_static(b"headline one")).await;
    alice.send(Bytes::from_static(b"headline two")).await;

    // Отправитель не ждал табло; в слоте осталась первая строка.
    let shown = timeout(Duration::from_secs(1), board.recv())
        .await
        .expect("board should hold one headline")
        .unwrap();
    println!("board shows: {} (the rest was dropped)\n", String::from_utf8_lossy(&shown));
}

/// Пример 4: отсоединение на лету — ушедший участник ничего не получает,
/// остальные продолжают.
async fn example_4_detach(
    hub: &Hub<Bytes>,
    bob: Arc<QueueConnector<Bytes>>,
    alice: &QueueConnector<Bytes>,
    moderator: &QueueConnector<Bytes>,
) {
    println!("Example 4: Detach mid-conversation");
    println!("----------------------------------");

    // Добираем то, что боб и модератор получили в примере 3.
    while timeout(Duration::from_millis(100), bob.recv()).await.is_ok() {}
    while timeout(Duration::from_millis(100), moderator.recv()).await.is_ok() {}

    hub.detach(bob.clone()).await;
    println!("bob detached");

    alice.send(Bytes::from_static(b"did bob leave?")).await;
    let at_moderator = moderator.recv().await.unwrap();
    println!("moderator saw: {}", String::from_utf8_lossy(&at_moderator));

    match timeout(Duration::from_millis(100), bob.recv()).await {
        Err(_) => println!("bob saw nothing, as expected"),
        Ok(msg) => println!("unexpected delivery to bob: {msg:?}"),
    }
}
