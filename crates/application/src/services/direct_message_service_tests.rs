//! 私信服务单元测试

use chrono::Duration;
use uuid::Uuid;

use domain::{ChatEvent, ConversationId, DomainError, MessageKind, Topic, UserId};

use crate::repository::DirectMessageRepository;
use crate::services::direct_message_service::*;
use crate::services::test_support::*;

fn service(world: &TestWorld) -> DirectMessageService {
    DirectMessageService::new(DirectMessageServiceDependencies {
        message_repository: world.direct_messages.clone(),
        gate: world.gate.clone(),
        notifier: world.notifier.clone(),
        clock: world.clock.clone(),
    })
}

fn text_request(room_id: Uuid, sender: Uuid, receiver: Uuid, body: &str) -> SendDirectMessageRequest {
    SendDirectMessageRequest {
        room_id,
        sender_id: sender,
        receiver_id: receiver,
        body: Some(body.to_owned()),
        kind: MessageKind::Text,
        file_url: None,
    }
}

/// 双方都已批准的测试房间
async fn pair_room(world: &TestWorld) -> (domain::Room, UserId, UserId) {
    let owner = UserId::generate();
    let a = UserId::generate();
    let b = UserId::generate();
    let room = world.seed_room(owner);
    world.seed_approved_member(room.id, a).await;
    world.seed_approved_member(room.id, b).await;
    (room, a, b)
}

#[tokio::test]
async fn send_publishes_to_both_personal_topics_with_conversation_id() {
    let world = TestWorld::new();
    let (room, a, b) = pair_room(&world).await;

    let message = service(&world)
        .send_message(text_request(room.id.into(), a.into(), b.into(), "hey"))
        .await
        .unwrap();

    let expected = ConversationId::derive(room.id, b, a); // 反向推导也一致
    assert_eq!(message.conversation_id(), expected);

    let published = world.notifier.published();
    let topics: Vec<Topic> = published.iter().map(|(t, _)| *t).collect();
    assert_eq!(topics, vec![Topic::User(a), Topic::User(b)]);
    for (_, envelope) in &published {
        match &envelope.event {
            ChatEvent::DirectMessageSent {
                conversation_id, ..
            } => assert_eq!(conversation_id, &expected),
            other => panic!("unexpected event {other:?}"),
        }
    }
}

#[tokio::test]
async fn receiver_must_be_an_approved_member() {
    let world = TestWorld::new();
    let owner = UserId::generate();
    let stranger = UserId::generate();
    let room = world.seed_room(owner);

    let result = service(&world)
        .send_message(text_request(
            room.id.into(),
            owner.into(),
            stranger.into(),
            "hello?",
        ))
        .await;

    assert_domain_error(result, |err| {
        matches!(err, DomainError::NotRoomParticipant)
    });
    assert!(world.notifier.published().is_empty());
}

#[tokio::test]
async fn self_messaging_is_rejected() {
    let world = TestWorld::new();
    let owner = UserId::generate();
    let room = world.seed_room(owner);

    let result = service(&world)
        .send_message(text_request(
            room.id.into(),
            owner.into(),
            owner.into(),
            "echo",
        ))
        .await;

    assert_domain_error(result, |err| {
        matches!(err, DomainError::OperationNotAllowed { .. })
    });
}

#[tokio::test]
async fn mark_read_bulk_sets_read_at_and_notifies_both_parties() {
    let world = TestWorld::new();
    let (room, a, b) = pair_room(&world).await;
    let svc = service(&world);

    svc.send_message(text_request(room.id.into(), a.into(), b.into(), "one"))
        .await
        .unwrap();
    world.clock.advance(Duration::seconds(1));
    svc.send_message(text_request(room.id.into(), a.into(), b.into(), "two"))
        .await
        .unwrap();

    // B 把来自 A 的消息全部置为已读
    let count = svc
        .mark_read(room.id.into(), b.into(), a.into())
        .await
        .unwrap();
    assert_eq!(count, 2);

    let read_events: Vec<(Topic, Vec<domain::MessageId>)> = world
        .notifier
        .published()
        .into_iter()
        .filter_map(|(topic, envelope)| match envelope.event {
            ChatEvent::DirectMessageRead { message_ids, .. } => Some((topic, message_ids)),
            _ => None,
        })
        .collect();

    // 已读回执发给双方
    assert_eq!(read_events.len(), 2);
    assert_eq!(read_events[0].0, Topic::User(b));
    assert_eq!(read_events[1].0, Topic::User(a));
    assert_eq!(read_events[0].1.len(), 2);

    // 再跑一次没有新的未读
    let again = svc
        .mark_read(room.id.into(), b.into(), a.into())
        .await
        .unwrap();
    assert_eq!(again, 0);
}

#[tokio::test]
async fn typing_goes_only_to_the_receiver() {
    let world = TestWorld::new();
    let (room, a, b) = pair_room(&world).await;

    service(&world)
        .typing(TypingRequest {
            room_id: room.id.into(),
            sender_id: a.into(),
            receiver_id: b.into(),
            is_typing: true,
        })
        .await
        .unwrap();

    let published = world.notifier.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].0, Topic::User(b));
    match &published[0].1.event {
        ChatEvent::DirectMessageTyping {
            conversation_id,
            is_typing,
            user,
            ..
        } => {
            assert!(*is_typing);
            assert_eq!(user.id, a);
            assert_eq!(conversation_id, &ConversationId::derive(room.id, a, b));
        }
        other => panic!("unexpected event {other:?}"),
    }
    // 假件不落库：输入指示没有任何持久化痕迹
    assert!(world
        .direct_messages
        .list_conversation(room.id, a, b, 0, 10)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn image_direct_message_cannot_be_edited() {
    let world = TestWorld::new();
    let (room, a, b) = pair_room(&world).await;
    let svc = service(&world);

    let message = svc
        .send_message(SendDirectMessageRequest {
            room_id: room.id.into(),
            sender_id: a.into(),
            receiver_id: b.into(),
            body: None,
            kind: MessageKind::Image,
            file_url: Some("/files/images/cat.png".to_owned()),
        })
        .await
        .unwrap();

    let result = svc
        .edit_message(EditDirectMessageRequest {
            room_id: room.id.into(),
            message_id: message.id.into(),
            actor_id: a.into(),
            body: "not allowed".to_owned(),
        })
        .await;

    assert_domain_error(result, |err| {
        matches!(err, DomainError::OperationNotAllowed { .. })
    });
}

#[tokio::test]
async fn soft_deleted_message_leaves_the_listing_but_keeps_the_row() {
    let world = TestWorld::new();
    let (room, a, b) = pair_room(&world).await;
    let svc = service(&world);

    let message = svc
        .send_message(text_request(room.id.into(), a.into(), b.into(), "oops"))
        .await
        .unwrap();

    svc.delete_message(room.id.into(), message.id.into(), a.into())
        .await
        .unwrap();

    let listed = svc
        .list_conversation(room.id.into(), a.into(), b.into(), 1)
        .await
        .unwrap();
    assert!(listed.is_empty());

    let row = world
        .direct_messages
        .find_by_id(message.id)
        .await
        .unwrap()
        .unwrap();
    assert!(row.is_deleted);
    assert!(row.deleted_at.is_some());
}
