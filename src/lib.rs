pub mod core;
pub mod storage;
pub mod schema;
pub mod query;
pub mod repo;

/*
┌──────────────────────────────────────────────── NAVDB LAYOUT ────────────────────────────────────────────────┐
│                                                                                                               │
│  repo::Tables ── Repository<Nav> / Repository<NavClass> / NewsRepository / Repository<NewsClass> / ...        │
│        │                                   │ (news + news_content fan-out)                                    │
│        ▼                                   ▼                                                                  │
│  ┌──────────────────────────────── struct Database ─────────────────────────────────┐                        │
│  │ conn: Mutex<rusqlite::Connection>   // one SQLite handle                         │                        │
│  │ ids: Arc<IdAllocator>               // per-table counters, JSON file             │                        │
│  │ columns: ColumnCache                // LRU of live column sets                   │                        │
│  │ validator: FilterValidator          // depth / clause / column checks            │                        │
│  └──────────────────────────────────────────────────────────────────────────────────┘                        │
│        │                    │                          │                                                      │
│        ▼                    ▼                          ▼                                                      │
│  schema::TableSchema   query::Predicate ──► query::sql::SqlBuilder ──► Statement { sql, params }              │
│  schema::Record        query::QueryParams / UpdateData / WriteOutcome                                         │
│                                                                                                               │
│  insert:  validate required ─► BEGIN IMMEDIATE ─► skip duplicates ─► next_id ─► INSERT ─► COMMIT ─► set_id    │
│  update:  UPDATE .. SET .. WHERE .. RETURNING id   (one statement per entry, one transaction)                 │
│  delete:  DELETE .. WHERE .. RETURNING id                                                                     │
│                                                                                                               │
└───────────────────────────────────────────────────────────────────────────────────────────────────────────────┘
*/
