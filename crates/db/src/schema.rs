use eyre::Result;
use sqlx::{Pool, Postgres};
use tracing::info;

pub async fn initialize_database(pool: &Pool<Postgres>) -> Result<()> {
    info!("Initializing database schema...");

    // Create schedule_windows table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schedule_windows (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            provider_id UUID NOT NULL,
            day_of_week SMALLINT NOT NULL,
            start_time TIME NOT NULL,
            end_time TIME NOT NULL,
            slot_duration_minutes INTEGER NOT NULL DEFAULT 30,
            timezone VARCHAR(64) NOT NULL DEFAULT 'UTC',
            is_active BOOLEAN NOT NULL DEFAULT TRUE,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            CONSTRAINT valid_day_of_week CHECK (day_of_week BETWEEN 0 AND 6),
            CONSTRAINT valid_window_times CHECK (end_time > start_time),
            CONSTRAINT valid_slot_duration CHECK (slot_duration_minutes > 0),
            CONSTRAINT one_window_per_weekday UNIQUE (provider_id, day_of_week)
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create time_slots table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS time_slots (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            provider_id UUID NOT NULL,
            schedule_window_id UUID NOT NULL REFERENCES schedule_windows(id),
            staff_id UUID NULL,
            start_at TIMESTAMP WITH TIME ZONE NOT NULL,
            end_at TIMESTAMP WITH TIME ZONE NOT NULL,
            status TEXT NOT NULL DEFAULT 'free',
            hold_expires_at TIMESTAMP WITH TIME ZONE NULL,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            CONSTRAINT valid_slot_times CHECK (end_at > start_at),
            CONSTRAINT valid_slot_status CHECK (
                status IN ('free', 'held', 'booked', 'cancelled', 'expired')
            ),
            CONSTRAINT one_slot_per_start UNIQUE (provider_id, start_at)
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Create bookings table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS bookings (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            customer_id UUID NOT NULL,
            provider_id UUID NOT NULL,
            time_slot_id UUID NOT NULL REFERENCES time_slots(id),
            status TEXT NOT NULL DEFAULT 'pending',
            notes TEXT NULL,
            created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
            cancelled_at TIMESTAMP WITH TIME ZONE NULL,
            CONSTRAINT valid_booking_status CHECK (
                status IN ('pending', 'confirmed', 'cancelled')
            )
        );
        "#,
    )
    .execute(pool)
    .await?;

    // At most one non-cancelled booking may reference a slot. Together with
    // the (provider_id, start_at) uniqueness above, this index carries the
    // exclusivity guarantee.
    sqlx::query(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS one_active_booking_per_slot
            ON bookings(time_slot_id) WHERE status <> 'cancelled';
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes; prepared statements take one command at a time
    let indexes = [
        "CREATE INDEX IF NOT EXISTS idx_windows_provider_id ON schedule_windows(provider_id)",
        "CREATE INDEX IF NOT EXISTS idx_time_slots_provider_start_status \
         ON time_slots(provider_id, start_at, status)",
        "CREATE INDEX IF NOT EXISTS idx_time_slots_window_id ON time_slots(schedule_window_id)",
        "CREATE INDEX IF NOT EXISTS idx_bookings_customer_status ON bookings(customer_id, status)",
        "CREATE INDEX IF NOT EXISTS idx_bookings_provider_id ON bookings(provider_id)",
        "CREATE INDEX IF NOT EXISTS idx_bookings_time_slot_id ON bookings(time_slot_id)",
    ];
    for index in indexes {
        sqlx::query(index).execute(pool).await?;
    }

    info!("Database schema initialized successfully.");
    Ok(())
}
