diesel::table! {
    packages (id) {
        id -> Integer,
        name -> Text,
        downloads -> BigInt,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    package_versions (id) {
        id -> Integer,
        package_id -> Integer,
        number -> Text,
        platform -> Text,
        authors -> Nullable<Text>,
        description -> Nullable<Text>,
        summary -> Nullable<Text>,
        full_name -> Text,
        indexed -> Bool,
        prerelease -> Bool,
        latest -> Bool,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    dependencies (id) {
        id -> Integer,
        version_id -> Integer,
        target_package_id -> Integer,
        requirements -> Text,
        scope -> Text,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::joinable!(package_versions -> packages (package_id));
diesel::joinable!(dependencies -> package_versions (version_id));
diesel::joinable!(dependencies -> packages (target_package_id));

diesel::allow_tables_to_appear_in_same_query!(packages, package_versions, dependencies,);
