use taskledger_core::db::open_db_in_memory;
use taskledger_core::{
    hash_password, AuthService, AuthServiceError, DuplicateKey, RepoError, SqliteUserRepository,
    UserRepository, UserRole, DEMO_PASSWORD_HASH,
};

#[test]
fn create_user_allocates_sequential_ids() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();

    let first = repo
        .create_user("a@company.com", "h1", UserRole::Main)
        .unwrap();
    let second = repo
        .create_user("b@company.com", "h2", UserRole::default())
        .unwrap();

    assert_eq!(first.id, 1);
    assert_eq!(second.id, 2);
    assert_eq!(second.role, UserRole::Team);
    assert_eq!(repo.get_user(2).unwrap(), Some(second));
    assert!(repo.get_user(3).unwrap().is_none());
}

#[test]
fn duplicate_email_is_rejected_without_persisting() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();
    repo.create_user("dup@company.com", "h1", UserRole::Team)
        .unwrap();

    let err = repo
        .create_user("dup@company.com", "h2", UserRole::Admin)
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Duplicate(DuplicateKey::UserEmail(ref email)) if email == "dup@company.com"
    ));

    let users = repo.get_all_users().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].password_hash, "h1");

    let next = repo
        .create_user("next@company.com", "h3", UserRole::Team)
        .unwrap();
    assert_eq!(next.id, 2);
}

#[test]
fn reads_return_none_or_empty_when_absent() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();

    assert!(repo.get_user_by_email("ghost@company.com").unwrap().is_none());
    assert!(repo.get_all_users().unwrap().is_empty());
}

#[test]
fn authenticate_matches_only_the_stored_hash() {
    let conn = open_db_in_memory().unwrap();
    let service = AuthService::new(SqliteUserRepository::try_new(&conn).unwrap());
    let created = service
        .sign_up(" lead@company.com ", "hunter2", UserRole::Main)
        .unwrap();
    assert_eq!(created.email, "lead@company.com");
    assert_eq!(created.password_hash, hash_password("hunter2"));

    let user = service
        .authenticate_user("lead@company.com", "hunter2")
        .unwrap()
        .unwrap();
    assert_eq!(user.id, created.id);

    for password in ["hunter3", "", "HUNTER2"] {
        assert!(service
            .authenticate_user("lead@company.com", password)
            .unwrap()
            .is_none());
    }
    assert!(service
        .authenticate_user("nobody@company.com", "hunter2")
        .unwrap()
        .is_none());
}

#[test]
fn sign_up_validates_input() {
    let conn = open_db_in_memory().unwrap();
    let service = AuthService::new(SqliteUserRepository::try_new(&conn).unwrap());

    assert!(matches!(
        service.sign_up("not-an-email", "pw", UserRole::Team),
        Err(AuthServiceError::InvalidEmail(_))
    ));
    assert!(matches!(
        service.sign_up("ok@company.com", "", UserRole::Team),
        Err(AuthServiceError::EmptyPassword)
    ));

    service
        .sign_up("ok@company.com", "pw", UserRole::Team)
        .unwrap();
    assert!(matches!(
        service.sign_up("ok@company.com", "pw", UserRole::Team),
        Err(AuthServiceError::Repo(RepoError::Duplicate(_)))
    ));
}

#[test]
fn demo_data_is_seeded_once() {
    let conn = open_db_in_memory().unwrap();
    let service = AuthService::new(SqliteUserRepository::try_new(&conn).unwrap());

    assert_eq!(service.initialize_demo_data().unwrap(), 2);
    assert_eq!(service.initialize_demo_data().unwrap(), 0);

    let users = service.list_users().unwrap();
    let emails = users.iter().map(|user| user.email.as_str()).collect::<Vec<_>>();
    assert_eq!(emails, vec!["admin@company.com", "user@company.com"]);
    assert_eq!(users[0].role, UserRole::Main);
    assert_eq!(users[1].role, UserRole::Team);
    assert!(users.iter().all(|user| user.password_hash == DEMO_PASSWORD_HASH));

    let admin = service
        .authenticate_user("admin@company.com", "password")
        .unwrap();
    assert!(admin.is_some());
}

#[test]
fn demo_data_is_skipped_when_users_exist() {
    let conn = open_db_in_memory().unwrap();
    let service = AuthService::new(SqliteUserRepository::try_new(&conn).unwrap());
    service
        .sign_up("first@company.com", "pw", UserRole::Main)
        .unwrap();

    assert_eq!(service.initialize_demo_data().unwrap(), 0);
    assert_eq!(service.list_users().unwrap().len(), 1);
}

#[test]
fn failed_seed_writes_no_accounts_and_can_be_retried() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteUserRepository::try_new(&conn).unwrap();

    let err = repo
        .create_users_if_empty(&[
            ("admin@company.com", DEMO_PASSWORD_HASH, UserRole::Main),
            ("admin@company.com", DEMO_PASSWORD_HASH, UserRole::Team),
        ])
        .unwrap_err();
    assert!(matches!(err, RepoError::Duplicate(DuplicateKey::UserEmail(_))));
    assert!(repo.get_all_users().unwrap().is_empty());

    let service = AuthService::new(repo);
    assert_eq!(service.initialize_demo_data().unwrap(), 2);
    let users = service.list_users().unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(users[0].id, 1);
    assert_eq!(users[1].email, "user@company.com");
}

#[test]
fn seeding_into_a_populated_store_is_a_no_op() {
    let conn = open_db_in_memory().unwrap();
    let first = SqliteUserRepository::try_new(&conn).unwrap();
    let second = SqliteUserRepository::try_new(&conn).unwrap();

    let accounts = [("solo@company.com", "h", UserRole::Main)];
    assert_eq!(first.create_users_if_empty(&accounts).unwrap().len(), 1);
    assert!(second.create_users_if_empty(&accounts).unwrap().is_empty());
    assert_eq!(second.get_all_users().unwrap().len(), 1);
}
